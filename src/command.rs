/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `balance [address-or-name]`
    Balance(Option<String>),
    /// `balanceaddr [address]`
    BalanceByAddress(Option<String>),
    Generate,
    Unknown,
}

#[derive(Clone, Copy)]
enum Kind {
    Balance,
    BalanceByAddress,
    Generate,
}

/// Checked in order, first hit wins. `balanceaddr` has to come before
/// `balance` or the shorter prefix would swallow it.
const PREFIXES: &[(&str, Kind)] = &[
    ("balanceaddr", Kind::BalanceByAddress),
    ("balance", Kind::Balance),
    ("generate", Kind::Generate),
];

/// Remove every `bot_mention` occurrence and one leading `/`.
pub fn normalize(text: &str, bot_mention: &str) -> String {
    let without_mention = if bot_mention.is_empty() {
        text.to_string()
    } else {
        text.replace(bot_mention, "")
    };
    let trimmed = without_mention.trim();
    trimmed.strip_prefix('/').unwrap_or(trimmed).trim().to_string()
}

impl Command {
    pub fn parse(text: &str, bot_mention: &str) -> Self {
        let text = normalize(text, bot_mention);

        let Some((prefix, kind)) = PREFIXES
            .iter()
            .find(|(prefix, _)| text.starts_with(prefix))
        else {
            return Command::Unknown;
        };

        let arg = text[prefix.len()..].trim();
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        match kind {
            Kind::Balance => Command::Balance(arg),
            Kind::BalanceByAddress => Command::BalanceByAddress(arg),
            Kind::Generate => Command::Generate,
        }
    }
}
