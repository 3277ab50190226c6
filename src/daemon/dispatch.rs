use anyhow::Result;
use log::{debug, warn};
use thiserror::Error;

use super::keys::{KeyCode, KeyMatch, Keywords};

pub const DEFAULT_BANNER: &str = concat!("multipathd (dmmp) v", env!("CARGO_PKG_VERSION"), "\n");

/// One matched keyword of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdKey {
    pub code:  KeyCode,
    pub param: Option<String>,
}

/// A tokenized, keyword-matched command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    keys: Vec<CmdKey>,
}

impl Command {
    pub fn keys(&self) -> &[CmdKey] {
        &self.keys
    }

    pub fn fingerprint(&self) -> KeyCode {
        self.keys
            .iter()
            .fold(KeyCode::empty(), |fp, k| fp | k.code)
    }

    /// Parameter bound to the first keyword with the given code.
    pub fn keyparam(&self, code: KeyCode) -> Option<&str> {
        self.keys
            .iter()
            .find(|k| k.code == code)
            .and_then(|k| k.param.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CmdError {
    #[error("unknown keyword '{0}'")]
    UnknownKeyword(String),
    #[error("ambiguous keyword '{0}'")]
    AmbiguousKeyword(String),
    #[error("keyword '{0}' needs a parameter")]
    NoParam(String),
    #[error("no handler registered for {0:?}")]
    NoHandler(KeyCode),
}

pub type HandlerFn<S> = Box<dyn Fn(&Command, &S) -> Result<String> + Send + Sync>;

struct Handler<S> {
    fingerprint: KeyCode,
    func:        Option<HandlerFn<S>>,
}

/// Split on whitespace; a double-quoted span is one token, quotes removed.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&c) = chars.peek() else { break };

        let mut tok = String::new();
        if c == '"' {
            chars.next();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                tok.push(c);
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                tok.push(c);
            }
        }
        tokens.push(tok);
    }
    tokens
}

/// Command dispatcher of the daemon's control socket: a keyword table and
/// a table of handlers keyed by command fingerprint.
pub struct Dispatcher<S> {
    banner:   String,
    keys:     Keywords,
    handlers: Vec<Handler<S>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Dispatcher<S> {
    /// Default keyword table, no handlers.
    pub fn new() -> Self {
        Self {
            banner:   DEFAULT_BANNER.to_string(),
            keys:     Keywords::default(),
            handlers: Vec::new(),
        }
    }

    /// Every command multipathd understands, none of them wired up yet.
    pub fn with_default_handlers() -> Self {
        let mut d = Self::new();
        for fp in DEFAULT_FINGERPRINTS {
            d.add_handler(*fp);
        }
        d
    }

    pub fn set_banner(&mut self, banner: impl Into<String>) {
        self.banner = banner.into();
    }

    pub fn keywords(&self) -> &Keywords {
        &self.keys
    }

    pub fn keywords_mut(&mut self) -> &mut Keywords {
        &mut self.keys
    }

    /// Register a fingerprint without a callback. Such a command is listed
    /// in the help but answered with it too.
    pub fn add_handler(&mut self, fp: KeyCode) {
        self.handlers.push(Handler { fingerprint: fp, func: None });
    }

    /// Attach a callback to an already registered fingerprint.
    pub fn set_handler_callback<F>(&mut self, fp: KeyCode, f: F) -> Result<(), CmdError>
    where
        F: Fn(&Command, &S) -> Result<String> + Send + Sync + 'static,
    {
        let h = self.handlers
            .iter_mut()
            .find(|h| h.fingerprint == fp)
            .ok_or(CmdError::NoHandler(fp))?;
        h.func = Some(Box::new(f));
        Ok(())
    }

    /// Set the callback for `fp`, registering the fingerprint if needed.
    pub fn handle<F>(&mut self, fp: KeyCode, f: F)
    where
        F: Fn(&Command, &S) -> Result<String> + Send + Sync + 'static,
    {
        match self.handlers.iter_mut().find(|h| h.fingerprint == fp) {
            Some(h) => h.func = Some(Box::new(f)),
            None    => self.handlers.push(Handler { fingerprint: fp, func: Some(Box::new(f)) }),
        }
    }

    pub fn parse(&self, line: &str) -> Result<Command, CmdError> {
        let mut keys: Vec<CmdKey> = Vec::new();
        let mut want_param: Option<String> = None;

        for tok in tokenize(line) {
            if want_param.take().is_some() {
                if let Some(last) = keys.last_mut() {
                    last.param = Some(tok);
                }
                continue;
            }

            let key = match self.keys.find(&tok) {
                KeyMatch::Found(k)  => k,
                KeyMatch::Ambiguous => return Err(CmdError::AmbiguousKeyword(tok)),
                KeyMatch::NotFound  => return Err(CmdError::UnknownKeyword(tok)),
            };
            if key.has_param {
                want_param = Some(key.name.clone());
            }
            keys.push(CmdKey { code: key.code, param: None });
        }

        match want_param {
            Some(name) => Err(CmdError::NoParam(name)),
            None       => Ok(Command { keys }),
        }
    }

    /// Help text: the banner, then one line per registered fingerprint.
    pub fn genhelp(&self) -> String {
        let mut reply = self.banner.clone();
        reply.push_str("CLI commands reference:\n");

        for h in &self.handlers {
            let mut fp = h.fingerprint;
            for key in self.keys.iter() {
                if !fp.intersects(key.code) {
                    continue;
                }
                fp.remove(key.code);

                reply.push(' ');
                reply.push_str(&key.name);
                for alias in self.keys.aliases(key) {
                    reply.push('|');
                    reply.push_str(&alias.name);
                }
                if key.has_param {
                    reply.push_str(" $");
                    reply.push_str(&key.name);
                }
            }
            reply.push('\n');
        }
        reply
    }

    /// Run one command line and return the reply text.
    pub fn parse_cmd(&self, line: &str, state: &S) -> String {
        let cmd = match self.parse(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("'{}': {}", line, e);
                return self.genhelp();
            }
        };

        let fp = cmd.fingerprint();
        let Some(func) = self.handlers
            .iter()
            .find(|h| h.fingerprint == fp)
            .and_then(|h| h.func.as_ref())
        else {
            debug!("'{}': no callback for {:?}", line, fp);
            return self.genhelp();
        };

        match func(&cmd, state) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("'{}' failed: {:#}", line, e);
                "fail\n".to_string()
            }
        }
    }
}

const DEFAULT_FINGERPRINTS: &[KeyCode] = {
    use KeyCode as K;
    &[
        K::LIST.union(K::PATHS),
        K::LIST.union(K::PATHS).union(K::FMT),
        K::LIST.union(K::PATHS).union(K::RAW).union(K::FMT),
        K::LIST.union(K::PATH),
        K::LIST.union(K::STATUS),
        K::LIST.union(K::DAEMON),
        K::LIST.union(K::MAPS),
        K::LIST.union(K::MAPS).union(K::STATUS),
        K::LIST.union(K::MAPS).union(K::STATS),
        K::LIST.union(K::MAPS).union(K::FMT),
        K::LIST.union(K::MAPS).union(K::RAW).union(K::FMT),
        K::LIST.union(K::MAPS).union(K::TOPOLOGY),
        K::LIST.union(K::GROUPS),
        K::LIST.union(K::TOPOLOGY),
        K::LIST.union(K::MAP).union(K::TOPOLOGY),
        K::LIST.union(K::CONFIG),
        K::LIST.union(K::BLACKLIST),
        K::LIST.union(K::DEVICES),
        K::LIST.union(K::WILDCARDS),
        K::ADD.union(K::PATH),
        K::DEL.union(K::PATH),
        K::ADD.union(K::MAP),
        K::DEL.union(K::MAP),
        K::SWITCH.union(K::MAP).union(K::GROUP),
        K::RECONFIGURE,
        K::SUSPEND.union(K::MAP),
        K::RESUME.union(K::MAP),
        K::RESIZE.union(K::MAP),
        K::RESET.union(K::MAP),
        K::RELOAD.union(K::MAP),
        K::DISABLEQ.union(K::MAP),
        K::RESTOREQ.union(K::MAP),
        K::DISABLEQ.union(K::MAPS),
        K::RESTOREQ.union(K::MAPS),
        K::REINSTATE.union(K::PATH),
        K::FAIL.union(K::PATH),
        K::QUIT,
        K::SHUTDOWN,
        K::GETPRSTATUS.union(K::MAP),
        K::SETPRSTATUS.union(K::MAP),
        K::UNSETPRSTATUS.union(K::MAP),
        K::FORCEQ.union(K::DAEMON),
        K::RESTOREQ.union(K::DAEMON),
    ]
};
