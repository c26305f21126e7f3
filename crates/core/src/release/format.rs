use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::parse;

/// Groups whose pack names are used as-is for the folder name.
static IGNORED_GROUPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(ZR)$").unwrap());

static ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:"*?<>|]"#).unwrap());

static AUDIO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(AAC|DDP)\.(\d\.\d)").unwrap());

static DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.+").unwrap());

/// Folder name for an announced season pack inside the pre-import tree.
///
/// Strips characters that are illegal in paths, turns spaces into dots,
/// fixes `DDP.5.1` style audio tags and collapses runs of dots.
pub fn format_pack_title(pack_name: &str) -> String {
    let release = parse(pack_name);
    if IGNORED_GROUPS.is_match(&release.group) {
        return pack_name.to_string();
    }

    let name = ILLEGAL.replace_all(pack_name, "");
    let name = name.replace(' ', ".");
    let name = AUDIO.replace_all(&name, "${1}${2}");
    DOTS.replace_all(&name, ".").into_owned()
}
