//! Integration tests for the scheduled eBird hybrids report

use async_trait::async_trait;
use fieldnotes::commands::{CommandContext, CommandDispatcher, Reply};
use fieldnotes::core::{ReportScheduler, ReportSink};
use fieldnotes::services::{EbirdClient, INatClient};
use fieldnotes::settings::{GlobalSettings, MemorySettings, SettingsStore};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(u64, String)>>,
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn send(
        &self,
        channel_id: u64,
        message: String,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent.lock().await.push((channel_id, message));
        Ok(())
    }
}

struct Fixture {
    dispatcher: Arc<CommandDispatcher>,
    ebird: MockServer,
    settings: Arc<MemorySettings>,
    sink: Arc<RecordingSink>,
    scheduler: ReportScheduler,
}

async fn fixture() -> Fixture {
    let ebird = MockServer::start().await;
    let settings = Arc::new(MemorySettings::new());
    let dispatcher = CommandDispatcher::new(
        ",",
        Arc::new(INatClient::new("http://127.0.0.1:9")),
        Arc::new(EbirdClient::new(ebird.uri(), Some("test-key".to_string()))),
        settings.clone(),
    );
    let dispatcher = Arc::new(dispatcher);
    let sink = Arc::new(RecordingSink::default());
    let scheduler = ReportScheduler::new(dispatcher.clone(), sink.clone(), "0 0 5 * * *")
        .expect("valid cron expression");
    Fixture {
        dispatcher,
        ebird,
        settings,
        sink,
        scheduler,
    }
}

#[tokio::test]
async fn report_is_skipped_without_channel() {
    let fixture = fixture().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&fixture.ebird)
        .await;

    assert_eq!(fixture.scheduler.run_once().await.unwrap(), 0);
    assert!(fixture.sink.sent.lock().await.is_empty());
}

#[tokio::test]
async fn report_is_posted_to_configured_channel() {
    let fixture = fixture().await;
    fixture
        .settings
        .set_global(&GlobalSettings {
            ebird_region: "US-NY".to_string(),
            ebird_days: 7,
            report_channel: Some(555),
            ..GlobalSettings::default()
        })
        .await
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/v2/data/obs/US-NY/recent"))
        .and(query_param("back", "7"))
        .and(query_param("cat", "hybrid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.ebird)
        .await;

    assert_eq!(fixture.scheduler.run_once().await.unwrap(), 1);
    let sent = fixture.sink.sent.lock().await;
    assert_eq!(
        *sent,
        vec![(555, "No hybrids observed in the past 7 days.".to_string())]
    );
}

#[tokio::test]
async fn owner_commands_configure_the_report() {
    let fixture = fixture().await;
    Mock::given(method("GET"))
        .and(path("/v2/data/obs/CA-NS/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "speciesCode": "x00776",
            "comName": "Mallard x American Black Duck (hybrid)",
            "sciName": "Anas platyrhynchos x rubripes",
            "locName": "Sullivans Pond",
            "obsDt": "2021-01-05 14:32",
            "howMany": 2
        }])))
        .mount(&fixture.ebird)
        .await;
    let owner = CommandContext {
        channel_id: 42,
        is_owner: true,
        ..CommandContext::default()
    };
    let run = |line: &'static str| {
        let dispatcher = fixture.dispatcher.clone();
        let owner = owner.clone();
        async move { dispatcher.dispatch(&owner, line).await.unwrap() }
    };

    assert_eq!(
        run(",ebird setchannel <#777>").await,
        vec![Reply::text("The hybrids report will be posted to <#777>.")]
    );
    assert_eq!(
        run(",ebird setformat %Q").await,
        vec![Reply::text(
            "`%Q` is not a valid date format. Use strftime codes like `%H:%M, %d %b`."
        )]
    );
    assert_eq!(
        run(",ebird setformat %d/%m %H:%M").await,
        vec![Reply::text("eBird date format has been changed.")]
    );

    assert_eq!(fixture.scheduler.run_once().await.unwrap(), 1);
    assert_eq!(
        fixture.sink.sent.lock().await.clone(),
        vec![(
            777,
            "Mallard x American Black Duck (hybrid) (Anas platyrhynchos x rubripes); \
             2 observed at 05/01 14:32, from Sullivans Pond"
                .to_string()
        )]
    );

    // No argument means the channel the command was sent in.
    run(",ebird setchannel").await;
    assert_eq!(fixture.settings.global().await.unwrap().report_channel, Some(42));
    run(",EBIRD SetChannel none").await;
    assert_eq!(fixture.settings.global().await.unwrap().report_channel, None);
    assert_eq!(fixture.scheduler.run_once().await.unwrap(), 0);
}

#[tokio::test]
async fn report_settings_need_the_owner() {
    let fixture = fixture().await;
    let admin = CommandContext {
        guild_id: Some(1),
        is_admin: true,
        ..CommandContext::default()
    };
    let replies = fixture
        .dispatcher
        .dispatch(&admin, ",ebird setchannel 777")
        .await
        .unwrap();
    assert_eq!(
        replies,
        vec![Reply::text(
            "You don't have permission to do that: only the bot owner can change this."
        )]
    );
    assert_eq!(fixture.settings.global().await.unwrap().report_channel, None);
}

#[tokio::test]
async fn scheduler_starts_and_stops() {
    let fixture = fixture().await;
    assert!(!fixture.scheduler.is_running().await);
    fixture.scheduler.start().await;
    assert!(fixture.scheduler.is_running().await);
    fixture.scheduler.stop().await;
    assert!(!fixture.scheduler.is_running().await);
}

#[tokio::test]
async fn invalid_cron_expression_is_rejected() {
    let dispatcher = CommandDispatcher::new(
        ",",
        Arc::new(INatClient::new("http://127.0.0.1:9")),
        Arc::new(EbirdClient::new("http://127.0.0.1:9", None)),
        Arc::new(MemorySettings::new()),
    );
    let sink = Arc::new(RecordingSink::default());
    assert!(ReportScheduler::new(Arc::new(dispatcher), sink, "not a cron").is_err());
}
