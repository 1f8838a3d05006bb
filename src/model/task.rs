use url::Url;

/// One playlist to export: a display name plus the URL or bare ID to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub input: String,
}

impl Task {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
        }
    }

    /// Builds a task from a command-line argument. The name is the playlist ID
    /// when it can be read from the `list` query parameter.
    pub fn from_argument(arg: &str) -> Self {
        let name = playlist_id_from_input(arg).unwrap_or_else(|| arg.to_string());
        Self::new(name, arg)
    }
}

pub fn playlist_id_from_input(input: &str) -> Option<String> {
    if !input.contains("list=") {
        return Some(input.to_string()).filter(|s| !s.is_empty());
    }

    if let Ok(url) = Url::parse(input) {
        if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "list") {
            return Some(id.into_owned()).filter(|s| !s.is_empty());
        }
    }

    // Not a parseable URL; take whatever follows the first `list=`.
    input
        .split_once("list=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or_default().to_string())
        .filter(|s| !s.is_empty())
}
