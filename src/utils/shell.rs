//! Shell escaping, quoting, and command composition.
//!
//! Composed commands are sent to the remote host as one opaque string and run
//! by a shell there. Anything that came from a caller goes through
//! [`quote_arg`]; only `&'static str` fragments are emitted verbatim.

/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote a single argument for shell execution.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    // Characters that require quoting
    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\r', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{',
        '}', '<', '>', '|', '&', ';', '#', '~', '=', '%',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Quote a path for shell execution (always quotes).
pub fn quote_path(path: &str) -> String {
    format!("'{}'", escape_single_quote_content(path))
}

/// One simple command: a program followed by literal flags and quoted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    parts: Vec<String>,
}

impl CommandLine {
    pub fn new(program: &'static str) -> Self {
        Self {
            parts: vec![program.to_string()],
        }
    }

    /// Caller-supplied positional value, always quoted when needed.
    pub fn arg(mut self, value: &str) -> Self {
        self.parts.push(quote_arg(value));
        self
    }

    /// Caller-supplied path, always quoted.
    pub fn path(mut self, value: &str) -> Self {
        self.parts.push(quote_path(value));
        self
    }

    /// Fixed token emitted verbatim (`--activate`, `-type`, `{}`, `\;`).
    pub fn literal(mut self, token: &'static str) -> Self {
        self.parts.push(token.to_string());
        self
    }

    /// `--name=<quoted value>`
    pub fn option(mut self, name: &'static str, value: &str) -> Self {
        self.parts.push(format!("--{}={}", name, quote_path(value)));
        self
    }

    pub fn render(&self) -> String {
        self.parts.join(" ")
    }
}

/// Commands chained with `&&`, optionally run from a working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellScript {
    workdir: Option<String>,
    commands: Vec<CommandLine>,
}

impl ShellScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: &str) -> Self {
        Self {
            workdir: Some(dir.to_string()),
            commands: Vec::new(),
        }
    }

    pub fn then(mut self, command: CommandLine) -> Self {
        self.commands.push(command);
        self
    }

    pub fn render(&self) -> String {
        let mut chain = Vec::with_capacity(self.commands.len() + 1);
        if let Some(dir) = &self.workdir {
            chain.push(format!("cd {}", quote_path(dir)));
        }
        chain.extend(self.commands.iter().map(CommandLine::render));
        chain.join(" && ")
    }
}

/// Write `content` verbatim to `path` through a quoted heredoc.
///
/// The delimiter is quoted so the remote shell performs no expansion inside
/// the body, and it is suffixed until no body line equals it.
pub fn heredoc_write(path: &str, content: &str) -> String {
    let delimiter = heredoc_delimiter(content);
    let body = content.strip_suffix('\n').unwrap_or(content);
    format!(
        "cat > {} << '{}'\n{}\n{}",
        quote_path(path),
        delimiter,
        body,
        delimiter
    )
}

fn heredoc_delimiter(content: &str) -> String {
    const BASE: &str = "CPDEPLOY_EOF";
    let collides = |candidate: &str| content.lines().any(|line| line.trim_end() == candidate);

    let mut candidate = BASE.to_string();
    let mut n = 1;
    while collides(&candidate) {
        candidate = format!("{}_{}", BASE, n);
        n += 1;
    }
    candidate
}
