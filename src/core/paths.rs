// ─── Path Expansion ───
// Stored paths keep their `~` and `$VAR` placeholders; they are expanded only
// at the point of use.

use std::path::{Path, PathBuf};

/// Expand environment variables (`$VAR`, `${VAR}`) and a leading `~`.
///
/// Unknown variables are left untouched, matching shell `expandvars`
/// semantics rather than failing.
pub fn expand_full_path(raw: &Path) -> PathBuf {
    let text = raw.to_string_lossy();
    let with_vars = expand_env_vars(&text);
    PathBuf::from(expand_home(&with_vars))
}

fn expand_home(raw: &str) -> String {
    let Some(rest) = raw.strip_prefix('~') else {
        return raw.to_string();
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return raw.to_string();
    }
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => raw.to_string(),
    }
}

fn expand_env_vars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        let rest = &raw[idx + 1..];
        let (name, consumed) = if let Some(braced) = rest.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            (&rest[..end], end)
        };

        match (name.is_empty(), std::env::var(name)) {
            (false, Ok(value)) => {
                out.push_str(&value);
                for _ in 0..consumed {
                    chars.next();
                }
            }
            _ => out.push('$'),
        }
    }

    out
}

/// The platform's conventional game directory, in unexpanded form.
pub fn default_game_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from("${APPDATA}/.minecraft")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("~/Library/Application Support/minecraft")
    } else {
        PathBuf::from("~/.minecraft")
    }
}
