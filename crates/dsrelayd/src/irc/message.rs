//! Minimal IRC line parsing. Covers registration, keepalive and channel
//! messages, nothing more.

/// One parsed server line. The trailing parameter, if any, is the last
/// entry of `params` with its leading ':' removed.
#[derive(Debug, PartialEq, Eq)]
pub struct IrcMessage<'a> {
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
}

impl<'a> IrcMessage<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ')?;
                rest = tail;
                Some(prefix)
            }
            None => None,
        };

        let rest = rest.trim_start();
        let (command, mut rest) = match rest.split_once(' ') {
            Some((cmd, tail)) => (cmd, tail),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing);
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param);
                    rest = tail;
                }
                None => {
                    params.push(rest);
                    break;
                }
            }
        }

        Some(IrcMessage {
            prefix,
            command,
            params,
        })
    }

    /// Sender nick from a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&'a str> {
        self.prefix.map(|p| p.split('!').next().unwrap_or(p))
    }
}

/// Outbound lines must not smuggle extra commands.
pub fn sanitize(line: &str) -> String {
    line.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
