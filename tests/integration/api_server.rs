//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, commands and listeners
//! against mocked iNaturalist and eBird APIs.

#[path = "api_server/test_utils.rs"]
mod test_utils;

use fieldnotes::commands::CommandContext;
use fieldnotes::settings::{GuildSettings, SettingsStore};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use test_utils::{
    cardinal, manager, member, only_embed, only_text, page, taxon, TestApiServer, API_TOKEN,
    EBIRD_KEY,
};

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "fieldnotes");
    assert_eq!(body["prefix"], ",");
}

#[tokio::test]
async fn metrics_endpoint_tracks_commands() {
    let app = TestApiServer::new().await;
    app.command("help", &CommandContext::default()).await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);
    let body = response.text();
    assert!(body.contains("http_requests_total"), "{body}");
    assert!(body.contains("http_request_duration_seconds"), "{body}");
    assert!(
        body.contains(r#"fieldnotes_commands_total{command="help",outcome="ok"} 1"#),
        "{body}"
    );
}

#[tokio::test]
async fn unknown_command_is_not_found() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/commands")
        .json(&json!({ "command": ",nosuchthing" }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn prefix_is_optional() {
    let app = TestApiServer::new().await;
    let with_prefix = app.command(",help", &CommandContext::default()).await;
    let without_prefix = app.command("help", &CommandContext::default()).await;
    assert_eq!(with_prefix, without_prefix);
    assert!(only_text(&with_prefix).contains("taxon"));
}

#[tokio::test]
async fn usage_errors_are_replies() {
    let app = TestApiServer::new().await;
    let body = app.command("taxon", &CommandContext::default()).await;
    assert_eq!(only_text(&body), "Usage: `,taxon <query>`");

    let body = app.command("taxon 9083 sp", &CommandContext::default()).await;
    assert_eq!(only_text(&body), "Taxon IDs are unique. Retry without any ranks: `sp`, `genus`, etc.");
}

#[tokio::test]
async fn taxon_by_id_shows_hierarchy() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;

    let body = app.command("taxon 9083", &CommandContext::default()).await;
    let embed = only_embed(&body);
    assert_eq!(embed["title"], "*Cardinalis cardinalis* (Northern Cardinal)");
    assert_eq!(embed["url"], "https://www.inaturalist.org/taxa/9083");
    let description = embed["description"].as_str().unwrap();
    assert!(description.starts_with("is a species with [1,234]"), "{description}");
    assert!(description.contains("**Passeriformes**"), "{description}");
}

#[tokio::test]
async fn taxon_by_user_adds_counts() {
    let app = TestApiServer::new().await;
    let genus = json!({
        "id": 12704,
        "name": "Cardinalis",
        "rank": "genus",
        "matched_term": "Cardinalis",
        "observations_count": 5000,
        "ancestor_ids": [48460, 1, 3, 7251, 9079, 12704],
    });
    Mock::given(method("GET"))
        .and(path("/v1/taxa/autocomplete"))
        .and(query_param("q", "cardinalis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![genus])))
        .mount(&app.inat)
        .await;
    let mut full = taxon(12704, "Cardinalis", "genus", None, &[48460, 1, 3, 7251, 9079, 12704]);
    full["ancestors"] = json!([
        taxon(1, "Animalia", "kingdom", Some("Animals"), &[48460, 1]),
        taxon(3, "Aves", "class", Some("Birds"), &[48460, 1, 3]),
    ]);
    app.mock_inat("/v1/taxa/12704", page(vec![full])).await;
    app.mock_inat(
        "/v1/users/ben",
        page(vec![json!({ "id": 5, "login": "ben", "name": "Ben" })]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("user_id", "5"))
        .and(query_param("taxon_id", "12704"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_results": 12, "results": [] })))
        .mount(&app.inat)
        .await;
    app.mock_inat(
        "/v1/observations/species_counts",
        json!({ "total_results": 3, "results": [] }),
    )
    .await;

    let body = app
        .command("taxon cardinalis by ben", &CommandContext::default())
        .await;
    let embed = only_embed(&body);
    let description = embed["description"].as_str().unwrap();
    assert!(description.contains("__obs# (spp#) by user:__"), "{description}");
    assert!(description.contains("[12 (3)]("), "{description}");
    assert!(
        description.ends_with("[Ben (ben)](https://www.inaturalist.org/people/ben)"),
        "{description}"
    );
}

#[tokio::test]
async fn taxon_without_match_is_reported() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/autocomplete", page(Vec::new())).await;

    let body = app
        .command("taxon xyzzy plugh", &CommandContext::default())
        .await;
    assert_eq!(only_text(&body), "No matching taxon found.");
}

#[tokio::test]
async fn related_finds_common_ancestor() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;
    app.mock_inat(
        "/v1/taxa/13858",
        page(vec![taxon(
            13858,
            "Passer domesticus",
            "species",
            Some("House Sparrow"),
            &[48460, 1, 3, 7251, 13695, 13857, 13858],
        )]),
    )
    .await;
    app.mock_inat(
        "/v1/taxa/7251",
        page(vec![taxon(7251, "Passeriformes", "order", Some("Perching Birds"), &[48460, 1, 3, 7251])]),
    )
    .await;

    let body = app
        .command("related 9083, 13858, xyzzy plugh", &CommandContext::default())
        .await;
    let embed = only_embed(&body);
    assert_eq!(embed["title"], "Closest related taxon");
    let description = embed["description"].as_str().unwrap();
    assert!(
        description.contains("**are related by order**: Order Passeriformes (Perching Birds)"),
        "{description}"
    );
    assert_eq!(
        embed["footer"],
        "Some taxa could not be found and were ignored: xyzzy plugh"
    );
}

#[tokio::test]
async fn ebird_hybrids_lists_recent_records() {
    let app = TestApiServer::new().await;
    Mock::given(method("GET"))
        .and(path("/v2/data/obs/CA-NS/recent"))
        .and(header("X-eBirdApiToken", EBIRD_KEY))
        .and(query_param("cat", "hybrid"))
        .and(query_param("back", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "speciesCode": "x00776",
                "comName": "Mallard x American Black Duck (hybrid)",
                "sciName": "Anas platyrhynchos x rubripes",
                "locName": "Sullivans Pond",
                "obsDt": "2021-01-05 14:32",
                "howMany": 2
            },
            {
                "speciesCode": "x00004",
                "comName": "Glaucous x Glaucous-winged Gull (hybrid)",
                "sciName": "Larus hyperboreus x glaucescens",
                "locName": "Halifax Harbour",
                "obsDt": "2021-01-04"
            }
        ])))
        .expect(1)
        .mount(&app.ebird)
        .await;

    let body = app.command("ebird hybrids", &CommandContext::default()).await;
    let text = only_text(&body);
    assert_eq!(
        text,
        "Mallard x American Black Duck (hybrid) (Anas platyrhynchos x rubripes); \
         2 observed at 14:32, 05 Jan, from Sullivans Pond\n\
         Glaucous x Glaucous-winged Gull (hybrid) (Larus hyperboreus x glaucescens); \
         X observed at 2021-01-04, from Halifax Harbour"
    );
}

#[tokio::test]
async fn ebird_without_key_explains_setup() {
    let app = TestApiServer::with_ebird_key(None).await;
    let body = app.command("ebird hybrids", &CommandContext::default()).await;
    assert!(only_text(&body).starts_with("The eBird API key is not set yet."));
}

#[tokio::test]
async fn ebird_settings_need_the_owner() {
    let app = TestApiServer::new().await;
    let body = app.command("ebird setdays 7", &manager()).await;
    assert_eq!(
        only_text(&body),
        "You don't have permission to do that: only the bot owner can change this."
    );

    let owner = CommandContext {
        is_owner: true,
        ..manager()
    };
    let body = app.command("ebird setdays 31", &owner).await;
    assert_eq!(only_text(&body), "Days must be a number from 1 to 30.");

    let body = app.command("ebird setdays 7", &owner).await;
    assert_eq!(
        only_text(&body),
        "eBird days to include in recent observations has been changed."
    );
    let body = app.command("ebird setregion us-ny", &owner).await;
    assert_eq!(only_text(&body), "eBird region has been changed.");

    let global = app.settings.global().await.unwrap();
    assert_eq!(global.ebird_days, 7);
    assert_eq!(global.ebird_region, "US-NY");
}

#[tokio::test]
async fn link_commands_round_trip_through_http() {
    let app = TestApiServer::new().await;
    let body = app
        .command("link add wiki https://en.wikipedia.org/wiki/{query_raw}", &manager())
        .await;
    assert_eq!(only_text(&body), "Link `,wiki` added.");

    let body = app.command(",wiki Northern_cardinal", &member()).await;
    assert_eq!(only_text(&body), "https://en.wikipedia.org/wiki/Northern_cardinal");
}

#[tokio::test]
async fn autoobs_previews_observation_links() {
    let app = TestApiServer::new().await;
    app.settings
        .set_guild(
            1,
            &GuildSettings {
                autoobs: true,
                ..GuildSettings::default()
            },
        )
        .await
        .unwrap();
    let mut observation = json!({
        "id": 123,
        "user": { "id": 5, "login": "ben" },
        "observed_on_string": "2021-05-01",
        "place_guess": "Halifax, NS",
        "quality_grade": "research",
        "photos": [{ "url": "https://static.inaturalist.org/photos/1/square.jpg" }]
    });
    observation["taxon"] = cardinal();
    app.mock_inat("/v1/observations/123", page(vec![observation])).await;

    let body = app
        .message("look at this https://www.inaturalist.org/observations/123", &member())
        .await;
    let embed = only_embed(&body);
    assert_eq!(embed["url"], "https://www.inaturalist.org/observations/123");
    assert_eq!(embed["image"], "https://static.inaturalist.org/photos/1/medium.jpg");
    let description = embed["description"].as_str().unwrap();
    assert!(description.contains(":white_check_mark: Research Grade"), "{description}");

    let metrics = app.server.get("/metrics").await.text();
    assert!(
        metrics.contains(r#"fieldnotes_listener_triggers_total{listener="autoobs"} 1"#),
        "{metrics}"
    );
}

#[tokio::test]
async fn listeners_stay_quiet_when_off() {
    let app = TestApiServer::new().await;
    let body = app
        .message("https://www.inaturalist.org/observations/123", &member())
        .await;
    assert_eq!(body["replies"], json!([]));

    let bot = app
        .server
        .post("/api/messages")
        .json(&json!({ "content": ".cardinalis.", "author_is_bot": true }))
        .await;
    assert_eq!(bot.json::<Value>()["replies"], json!([]));
}

#[tokio::test]
async fn dot_taxon_works_in_direct_messages() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;

    let body = app
        .message("what is .9083. anyway", &CommandContext::default())
        .await;
    let embed = only_embed(&body);
    assert_eq!(embed["title"], "*Cardinalis cardinalis* (Northern Cardinal)");
}

#[tokio::test]
async fn channel_can_turn_off_server_listener() {
    let app = TestApiServer::new().await;
    let body = app.command("inat set dot_taxon on server", &manager()).await;
    assert_eq!(only_text(&body), "Server dot_taxon is now on.");
    let body = app.command("inat set dot_taxon off", &manager()).await;
    assert_eq!(only_text(&body), "Channel dot_taxon is now off.");

    let body = app.message(".cardinalis.", &member()).await;
    assert_eq!(body["replies"], json!([]));
}

fn owner() -> CommandContext {
    CommandContext {
        is_owner: true,
        ..manager()
    }
}

fn observation_123() -> Value {
    let mut observation = json!({
        "id": 123,
        "user": { "id": 5, "login": "ben" },
        "observed_on": "2021-05-01",
        "quality_grade": "research",
    });
    observation["taxon"] = cardinal();
    observation
}

#[tokio::test]
async fn rights_claimed_without_the_token_are_ignored() {
    let app = TestApiServer::new().await;
    let denied = "You don't have permission to do that: only the bot owner can change this.";

    let body = app.command_with_token("ebird setregion us-ny", &owner(), None).await;
    assert_eq!(only_text(&body), denied);
    let body = app
        .command_with_token("ebird setregion us-ny", &owner(), Some("not-the-token"))
        .await;
    assert_eq!(only_text(&body), denied);
    let body = app
        .command_with_token("inat set listen off", &manager(), None)
        .await;
    assert_eq!(
        only_text(&body),
        "You don't have permission to do that: only server managers can change this."
    );
    assert_eq!(app.settings.global().await.unwrap().ebird_region, "CA-NS");
    assert!(app.settings.guild(1).await.unwrap().listen);

    let body = app
        .command_with_token("ebird setregion us-ny", &owner(), Some(API_TOKEN))
        .await;
    assert_eq!(only_text(&body), "eBird region has been changed.");
}

#[tokio::test]
async fn home_falls_back_from_user_to_server_to_global() {
    let app = TestApiServer::new().await;
    app.mock_inat(
        "/v1/places/6853",
        page(vec![json!({ "id": 6853, "display_name": "Nova Scotia, CA" })]),
    )
    .await;
    app.mock_inat(
        "/v1/places/6712",
        page(vec![json!({ "id": 6712, "display_name": "Canada" })]),
    )
    .await;

    let body = app.command("inat set global_home 6712", &manager()).await;
    assert_eq!(
        only_text(&body),
        "You don't have permission to do that: only the bot owner can change this."
    );
    let body = app.command("inat set global_home 6712", &owner()).await;
    assert_eq!(only_text(&body), "The default home place is now Canada.");
    let body = app.command("inat set server_home 6853", &member()).await;
    assert_eq!(
        only_text(&body),
        "You don't have permission to do that: only server managers can change this."
    );
    let body = app.command("INAT SET Server_Home 6853", &manager()).await;
    assert_eq!(only_text(&body), "This server's home place is now Nova Scotia, CA.");

    let body = app.command("place home", &member()).await;
    assert_eq!(only_embed(&body)["title"], "Nova Scotia, CA");
    let elsewhere = CommandContext {
        guild_id: Some(2),
        ..member()
    };
    let body = app.command("place home", &elsewhere).await;
    assert_eq!(only_embed(&body)["title"], "Canada");

    let body = app.command("inat show", &member()).await;
    let text = only_text(&body);
    assert!(text.contains("**Server settings:**\nhome place id: 6853"), "{text}");
    assert!(text.ends_with("Default home place id: 6712"), "{text}");

    let body = app.command("inat set server_home none", &manager()).await;
    assert_eq!(only_text(&body), "This server's home place is cleared.");
    let body = app.command("place home", &member()).await;
    assert_eq!(only_embed(&body)["title"], "Canada");
}

#[tokio::test]
async fn subcommands_ignore_case() {
    let app = TestApiServer::new().await;
    let body = app.command("ebird SETDAYS 7", &owner()).await;
    assert_eq!(
        only_text(&body),
        "eBird days to include in recent observations has been changed."
    );
    let body = app.command("Ebird Show", &member()).await;
    assert_eq!(
        only_text(&body),
        "**eBird settings:**\nregion: CA-NS\ndays: 7\ndate format: `%H:%M, %d %b`\nreport channel: not set"
    );
    let body = app.command("inat SET Autoobs ON", &manager()).await;
    assert_eq!(only_text(&body), "Channel autoobs is now on.");
    let body = app.command("LINK List", &member()).await;
    assert_eq!(only_text(&body), "No links defined.");
}

#[tokio::test]
async fn link_and_dot_taxon_in_one_message_both_answer() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/observations/123", page(vec![observation_123()])).await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;

    let body = app
        .message(
            "https://www.inaturalist.org/observations/123 is a .9083.",
            &CommandContext::default(),
        )
        .await;
    let replies = body["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 2, "{body}");
    assert_eq!(replies[0]["content"]["url"], "https://www.inaturalist.org/observations/123");
    assert_eq!(replies[1]["content"]["url"], "https://www.inaturalist.org/taxa/9083");
}

#[tokio::test]
async fn dot_taxon_ignores_controlled_terms() {
    let app = TestApiServer::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(Vec::new())))
        .expect(0)
        .mount(&app.inat)
        .await;

    let body = app
        .message("any .birds with sex female. here?", &CommandContext::default())
        .await;
    assert_eq!(body["replies"], json!([]));
    app.inat.verify().await;
}

#[tokio::test]
async fn search_places_lists_site_results() {
    let app = TestApiServer::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "nova scotia"))
        .and(query_param("sources", "places"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_results": 2,
            "results": [
                { "type": "Place", "record": { "id": 6853, "display_name": "Nova Scotia, CA" } },
                { "type": "Place", "record": { "id": 1, "display_name": "Nova Scotia Museum" } },
            ],
        })))
        .expect(1)
        .mount(&app.inat)
        .await;

    let body = app.command("search places nova scotia", &member()).await;
    let embed = only_embed(&body);
    assert_eq!(embed["title"], "Search: nova scotia in places");
    assert_eq!(
        embed["url"],
        "https://www.inaturalist.org/search?q=nova+scotia&sources=places"
    );
    assert_eq!(
        embed["description"],
        ":round_pushpin: [Nova Scotia, CA](https://www.inaturalist.org/places/6853)\n\
         :round_pushpin: [Nova Scotia Museum](https://www.inaturalist.org/places/1)"
    );
}

#[tokio::test]
async fn search_without_results_says_so() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/search", page(Vec::new())).await;

    let body = app.command("search users zzyzx", &member()).await;
    assert_eq!(
        only_text(&body),
        "Nothing matches that query. Check for mistakes in spelling or syntax. (searched for `zzyzx`)"
    );
    let body = app.command("search", &member()).await;
    assert_eq!(
        only_text(&body),
        "Usage: `,search [obs|taxa|places|projects|users|inactive|site] <query>`"
    );
}

#[tokio::test]
async fn search_defaults_to_observations() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;
    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("taxon_id", "9083"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_results": 25,
            "results": [observation_123()],
        })))
        .mount(&app.inat)
        .await;

    let body = app.command("s 9083", &member()).await;
    let embed = only_embed(&body);
    let description = embed["description"].as_str().unwrap();
    assert!(
        description.ends_with("(https://www.inaturalist.org/observations/123) by ben on 2021-05-01"),
        "{description}"
    );
    assert_eq!(embed["footer"], "Showing 1 of 25 results");
}

#[tokio::test]
async fn map_centers_on_observation_bounds() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;
    Mock::given(method("GET"))
        .and(path("/v1/observations"))
        .and(query_param("return_bounds", "true"))
        .and(query_param("taxon_id", "9083"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_results": 40,
            "total_bounds": { "swlat": 44.0, "swlng": -66.0, "nelat": 46.0, "nelng": -60.0 },
        })))
        .expect(1)
        .mount(&app.inat)
        .await;

    let body = app.command("map 9083", &member()).await;
    let embed = only_embed(&body);
    assert!(
        embed["title"].as_str().unwrap().starts_with("Range map for "),
        "{embed}"
    );
    assert_eq!(
        embed["url"],
        "https://www.inaturalist.org/taxa/map?taxa=9083#8/45/297"
    );
}

#[tokio::test]
async fn map_obs_links_the_observation_map() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/taxa/9083", page(vec![cardinal()])).await;

    let body = app.command("map obs 9083", &member()).await;
    let embed = only_embed(&body);
    assert_eq!(
        embed["url"],
        "https://www.inaturalist.org/observations/map?verifiable=true&taxon_id=9083"
    );
    assert!(embed["title"].as_str().unwrap().starts_with("Map of "), "{embed}");
}

#[tokio::test]
async fn last_finds_the_latest_link_in_history() {
    let app = TestApiServer::new().await;
    app.mock_inat("/v1/observations/123", page(vec![observation_123()])).await;
    let ctx = CommandContext {
        history: vec![
            "nice bird".to_string(),
            "see https://www.inaturalist.org/observations/123".to_string(),
            "older https://www.inaturalist.org/observations/999".to_string(),
        ],
        ..member()
    };

    let body = app.command("last obs", &ctx).await;
    assert_eq!(
        only_embed(&body)["url"],
        "https://www.inaturalist.org/observations/123"
    );
    let body = app.command("last taxon", &ctx).await;
    assert_eq!(only_text(&body), "Nothing found");
    let body = app.command("last", &ctx).await;
    assert_eq!(only_text(&body), "Usage: `,last obs|taxon`");
}
