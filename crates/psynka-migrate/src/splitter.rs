//! Breaks a migration script into individually executable statements.
//!
//! Two strategies exist. [`split_statements`] reproduces the original
//! tooling's behavior: split on every `;`, which mis-handles terminators
//! inside string literals, dollar-quoted function bodies, and mid-line
//! comments. [`split_statements_lexed`] is the corrected strategy that
//! tracks those constructs and only splits on top-level terminators.

/// Which splitting strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Split on every `;`. KNOWN LIMITATION: a `;` inside a quoted string,
    /// a dollar-quoted body, or a comment fragments the statement. Kept as
    /// the default for compatibility with the original script.
    #[default]
    Naive,
    /// Quote-, comment-, and dollar-quote-aware splitting.
    Lexed,
}

/// Split `sql` into trimmed statements, each re-terminated with `;`,
/// using the given mode.
pub fn split(sql: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Naive => split_statements(sql),
        SplitMode::Lexed => split_statements_lexed(sql),
    }
}

/// Naive splitter: cut on every `;`, trim, drop pieces that are empty or
/// start with a line comment, then re-append the terminator.
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|piece| !piece.is_empty() && !piece.starts_with("--"))
        .map(|piece| format!("{piece};"))
        .collect()
}

/// Corrected splitter: only a `;` outside strings, comments, and
/// dollar-quoted bodies terminates a statement. Pieces with no SQL content
/// (pure comments or whitespace) are dropped.
pub fn split_statements_lexed(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut pieces: Vec<String> = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            '\'' => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\'' {
                        // '' is an escaped quote, not a close
                        if chars.get(i + 1) == Some(&'\'') {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '$' => {
                if let Some(tag) = dollar_tag(&chars, i) {
                    i += tag.len();
                    while i < chars.len() {
                        if chars[i] == '$' && matches_tag(&chars, i, &tag) {
                            i += tag.len();
                            break;
                        }
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            }
            ';' => {
                pieces.push(chars[start..i].iter().collect());
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < chars.len() {
        pieces.push(chars[start..].iter().collect());
    }

    pieces
        .iter()
        .map(|piece| piece.trim())
        .filter(|piece| has_sql_content(piece))
        .map(|piece| format!("{piece};"))
        .collect()
}

/// If `chars[at]` opens a dollar quote (`$$` or `$tag$`), return the full
/// tag including both delimiters.
fn dollar_tag(chars: &[char], at: usize) -> Option<Vec<char>> {
    let mut end = at + 1;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    if chars.get(end) == Some(&'$') {
        Some(chars[at..=end].to_vec())
    } else {
        None
    }
}

fn matches_tag(chars: &[char], at: usize, tag: &[char]) -> bool {
    chars.len() >= at + tag.len() && chars[at..at + tag.len()] == *tag
}

/// True if the piece contains anything beyond whitespace and comments.
fn has_sql_content(piece: &str) -> bool {
    let chars: Vec<char> = piece.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            _ => return true,
        }
    }
    false
}
