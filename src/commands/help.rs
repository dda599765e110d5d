use super::context::Reply;
use super::dispatcher::CommandDispatcher;

const COMMANDS: &[(&str, &str)] = &[
    ("taxon <query>", "Show a taxon, e.g. `taxon genus prunella in animals`"),
    ("tname <query>", "Show only the name of a taxon"),
    ("related <taxon1>, <taxon2>...", "Closest common ancestor of the taxa"),
    ("obs <id|url|query>", "Show an observation"),
    ("user <login|@mention|me>", "Show an iNat user"),
    ("place <abbrev|name>", "Show a place; `place add|remove|list` manage abbreviations"),
    ("project <abbrev|name>", "Show a project; `project add|remove|list` manage abbreviations"),
    ("search [obs|taxa|places|projects|users|inactive|site] <query>", "Search iNat; observations by default"),
    ("map <taxon1>, <taxon2>...", "Range map of the taxa; `map obs <query>` maps observations"),
    ("last obs|taxon", "Show the last observation or taxon linked in this channel"),
    ("inat set <setting> <value>", "Settings: `user`, `home`, `server_home`, `global_home`, `autoobs`, `dot_taxon`, `listen`, `bot_prefixes`"),
    ("inat show settings", "Show your settings and this server's"),
    ("link add|remove|list", "Custom link commands; `{query}` in a template is replaced"),
    ("ebird hybrids", "Recent hybrid sightings; `ebird show|setregion|setdays|setchannel|setformat` configure it"),
];

impl CommandDispatcher {
    pub(crate) fn help(&self) -> Vec<Reply> {
        let mut lines = vec!["**Commands:**".to_string()];
        lines.extend(
            COMMANDS
                .iter()
                .map(|(usage, about)| format!("`{}{usage}`: {about}", self.prefix)),
        );
        lines.push(
            "Query keywords: `in`, `from`, `by`, `not by`, `id by`, `except by`, `with`, `in prj`, `since`, `until`, `on`, `added`, `opt`"
                .to_string(),
        );
        vec![Reply::text(lines.join("\n"))]
    }
}
