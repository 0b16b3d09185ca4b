//! Fenced code block info strings.

/// A meta flag recognized on a code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Source half of a before/after example.
    Before,
    /// Expanded half of a before/after example.
    After,
    /// Rendered as an editable playground backed by the macro engine.
    Interactive,
    /// Rendered as a before/after example whose "after" the engine produces.
    Macro,
}

impl Flag {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "interactive" => Some(Self::Interactive),
            "macro" => Some(Self::Macro),
            _ => None,
        }
    }
}

/// A parsed code fence info string such as `ts before file=user.ts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceInfo {
    /// First token, if any.
    pub lang: Option<String>,
    /// Recognized flags, in order of appearance.
    pub flags: Vec<Flag>,
    /// Optional filename hint.
    pub filename: Option<String>,
}

impl FenceInfo {
    /// Parse an info string.
    ///
    /// Flags are matched as whole, case-insensitive tokens, so `beforehand`
    /// is not `before`.
    pub fn parse(info: &str) -> Self {
        let mut tokens = info.split_whitespace();
        let lang = tokens.next().map(str::to_string);

        let mut flags = Vec::new();
        for token in tokens {
            if let Some(flag) = Flag::from_token(&token.to_lowercase()) {
                if !flags.contains(&flag) {
                    flags.push(flag);
                }
            }
        }

        Self {
            lang,
            flags,
            filename: extract_filename(info),
        }
    }

    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// The language tag, `typescript` when the fence has none.
    pub fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or("typescript")
    }
}

/// Extract filename from code fence info string if present.
///
/// Supports formats like:
/// - `ts filename="user.ts"`
/// - `ts file=user.ts`
pub fn extract_filename(info: &str) -> Option<String> {
    if let Some(start) = info.find("filename=\"") {
        let rest = &info[start + 10..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    if let Some(start) = info.find("file=") {
        let rest = &info[start + 5..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let filename = rest[..end].trim_matches('"');
        if !filename.is_empty() {
            return Some(filename.to_string());
        }
    }

    None
}
