//! Parsing of ipset's textual output.
//!
//! Everything that depends on the exact wording of ipset's output lives here:
//! the version banner, the `-n list` name listing, the `list` header block
//! (stripped for members, parsed for creation parameters) and the `test`
//! negation marker. If a future ipset release changes its output
//! grammar, this is the only module that needs to follow.

use once_cell::sync::Lazy;
use regex::Regex;

/// `ipset --version` prints e.g. "ipset v7.15, protocol version: 7".
static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v([0-9]+)\.([0-9]+)").expect("valid version regex"));

/// Everything up to and including the "Members:" header line.
static MEMBERS_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(.*\n)*Members:\n").expect("valid header regex"));

/// `ipset test` says "<entry> is NOT in set <name>." for absent entries.
static NEGATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bNOT\b").expect("valid negation regex"));

/// Header options without a value that must be repeated at create time.
const FLAG_OPTIONS: &[&str] = &["counters", "comment", "skbinfo", "forceadd"];

/// Header options followed by a value that must be repeated at create time.
const VALUED_OPTIONS: &[&str] = &["netmask", "markmask"];

/// Creation parameters reported in the header block of `ipset list <name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetHeader {
    pub name: Option<String>,
    pub set_type: Option<String>,
    pub family: Option<String>,
    pub hash_size: Option<u32>,
    pub max_elem: Option<u32>,
    pub timeout: Option<u32>,
    /// Extension flags and valued options (e.g. `counters`, `netmask 24`),
    /// as create arguments in header order.
    pub options: Vec<String>,
}

/// Result of interpreting `ipset test` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Present,
    Absent,
    /// Non-zero exit without the negation marker (missing set, bad entry...).
    Failed,
}

/// Extract the `vMAJOR.MINOR` token from version output.
///
/// Returns the matched token (e.g. `"v6.10"`) together with its numeric
/// components, or `None` if no token is present or a component overflows.
pub fn version_token(output: &str) -> Option<(&str, u64, u64)> {
    let caps = VERSION_TOKEN.captures(output)?;
    let token = caps.get(0)?.as_str();
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((token, major, minor))
}

/// Split `ipset -n list` output into set names.
pub fn names(output: &str) -> Vec<String> {
    split_lines(output)
}

/// Strip the header block of `ipset list <name>` and return member lines.
///
/// Members never appear before the "Members:" line in ipset's output, so the
/// header is removed greedily up to the last such line.
pub fn members(output: &str) -> Vec<String> {
    let body = MEMBERS_HEADER.replace_all(output, "");
    split_lines(&body)
}

/// Interpret `ipset test` output together with its exit status.
///
/// The negation marker wins over the exit status: ipset exits non-zero for
/// absent entries, and that must not be confused with a failing command.
pub fn test_outcome(combined_output: &str, success: bool) -> TestOutcome {
    if NEGATION_MARKER.is_match(combined_output) {
        TestOutcome::Absent
    } else if success {
        TestOutcome::Present
    } else {
        TestOutcome::Failed
    }
}

/// Parse the "Name:", "Type:" and "Header:" lines of `ipset list <name>`
/// (terse or full).
///
/// Only lines before "Members:" are considered. Tokens that do not affect
/// how a set must be re-created (`bucketsize`, `initval`...) are skipped.
/// Returns `None` when no "Type:" line is present.
pub fn header(output: &str) -> Option<SetHeader> {
    let mut header = SetHeader::default();

    for line in output.lines().take_while(|line| *line != "Members:") {
        if let Some(name) = line.strip_prefix("Name:") {
            header.name = Some(name.trim().to_string());
        } else if let Some(set_type) = line.strip_prefix("Type:") {
            header.set_type = Some(set_type.trim().to_string());
        } else if let Some(fields) = line.strip_prefix("Header:") {
            let tokens: Vec<&str> = fields.split_whitespace().collect();
            let mut i = 0;
            while i < tokens.len() {
                let value = tokens.get(i + 1).copied();
                let consumed = match (tokens[i], value) {
                    ("family", Some(v)) => {
                        header.family = Some(v.to_string());
                        true
                    }
                    ("hashsize", Some(v)) => {
                        header.hash_size = v.parse().ok();
                        true
                    }
                    ("maxelem", Some(v)) => {
                        header.max_elem = v.parse().ok();
                        true
                    }
                    ("timeout", Some(v)) => {
                        header.timeout = v.parse().ok();
                        true
                    }
                    (key, Some(v)) if VALUED_OPTIONS.contains(&key) => {
                        header.options.push(key.to_string());
                        header.options.push(v.to_string());
                        true
                    }
                    (flag, _) => {
                        if FLAG_OPTIONS.contains(&flag) {
                            header.options.push(flag.to_string());
                        }
                        false
                    }
                };
                i += if consumed { 2 } else { 1 };
            }
        }
    }

    header.set_type.is_some().then_some(header)
}

// Trailing newline artefacts are not entries.
fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
