use bitflags::bitflags;

bitflags! {
    /// Keyword codes. A command's fingerprint is the union of the codes of
    /// its keywords.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyCode: u64 {
        const LIST          = 1 << 0;
        const ADD           = 1 << 1;
        const DEL           = 1 << 2;
        const SWITCH        = 1 << 3;
        const SUSPEND       = 1 << 4;
        const RESUME        = 1 << 5;
        const REINSTATE     = 1 << 6;
        const FAIL          = 1 << 7;
        const RESIZE        = 1 << 8;
        const RESET         = 1 << 9;
        const RELOAD        = 1 << 10;
        const FORCEQ        = 1 << 11;
        const DISABLEQ      = 1 << 12;
        const RESTOREQ      = 1 << 13;
        const PATHS         = 1 << 14;
        const MAPS          = 1 << 15;
        const GROUPS        = 1 << 16;
        const PATH          = 1 << 17;
        const MAP           = 1 << 18;
        const GROUP         = 1 << 19;
        const RECONFIGURE   = 1 << 20;
        const DAEMON        = 1 << 21;
        const STATUS        = 1 << 22;
        const STATS         = 1 << 23;
        const TOPOLOGY      = 1 << 24;
        const CONFIG        = 1 << 25;
        const BLACKLIST     = 1 << 26;
        const DEVICES       = 1 << 27;
        const RAW           = 1 << 28;
        const WILDCARDS     = 1 << 29;
        const QUIT          = 1 << 30;
        const SHUTDOWN      = 1 << 31;
        const GETPRSTATUS   = 1 << 32;
        const SETPRSTATUS   = 1 << 33;
        const UNSETPRSTATUS = 1 << 34;
        const FMT           = 1 << 35;
    }
}

/// One keyword of the command vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name:      String,
    pub code:      KeyCode,
    /// The token after this keyword is its parameter.
    pub has_param: bool,
}

const DEFAULT_KEYS: &[(&str, KeyCode, bool)] = &[
    ("list",            KeyCode::LIST,          false),
    ("show",            KeyCode::LIST,          false),
    ("add",             KeyCode::ADD,           false),
    ("remove",          KeyCode::DEL,           false),
    ("del",             KeyCode::DEL,           false),
    ("switch",          KeyCode::SWITCH,        false),
    ("switchgroup",     KeyCode::SWITCH,        false),
    ("suspend",         KeyCode::SUSPEND,       false),
    ("resume",          KeyCode::RESUME,        false),
    ("reinstate",       KeyCode::REINSTATE,     false),
    ("fail",            KeyCode::FAIL,          false),
    ("resize",          KeyCode::RESIZE,        false),
    ("reset",           KeyCode::RESET,         false),
    ("reload",          KeyCode::RELOAD,        false),
    ("forcequeueing",   KeyCode::FORCEQ,        false),
    ("disablequeueing", KeyCode::DISABLEQ,      false),
    ("restorequeueing", KeyCode::RESTOREQ,      false),
    ("paths",           KeyCode::PATHS,         false),
    ("maps",            KeyCode::MAPS,          false),
    ("multipaths",      KeyCode::MAPS,          false),
    ("groups",          KeyCode::GROUPS,        false),
    ("path",            KeyCode::PATH,          true),
    ("map",             KeyCode::MAP,           true),
    ("multipath",       KeyCode::MAP,           true),
    ("group",           KeyCode::GROUP,         true),
    ("reconfigure",     KeyCode::RECONFIGURE,   false),
    ("daemon",          KeyCode::DAEMON,        false),
    ("status",          KeyCode::STATUS,        false),
    ("stats",           KeyCode::STATS,         false),
    ("topology",        KeyCode::TOPOLOGY,      false),
    ("config",          KeyCode::CONFIG,        false),
    ("blacklist",       KeyCode::BLACKLIST,     false),
    ("devices",         KeyCode::DEVICES,       false),
    ("raw",             KeyCode::RAW,           false),
    ("wildcards",       KeyCode::WILDCARDS,     false),
    ("quit",            KeyCode::QUIT,          false),
    ("exit",            KeyCode::QUIT,          false),
    ("shutdown",        KeyCode::SHUTDOWN,      false),
    ("getprstatus",     KeyCode::GETPRSTATUS,   false),
    ("setprstatus",     KeyCode::SETPRSTATUS,   false),
    ("unsetprstatus",   KeyCode::UNSETPRSTATUS, false),
    ("format",          KeyCode::FMT,           true),
];

/// Result of looking a token up in the keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch<'a> {
    Found(&'a Key),
    Ambiguous,
    NotFound,
}

/// Ordered keyword table.
#[derive(Debug, Clone)]
pub struct Keywords {
    keys: Vec<Key>,
}

impl Default for Keywords {
    fn default() -> Self {
        let mut k = Self::empty();
        for &(name, code, has_param) in DEFAULT_KEYS {
            k.add(name, code, has_param);
        }
        k
    }
}

impl Keywords {
    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    pub fn add(&mut self, name: &str, code: KeyCode, has_param: bool) {
        self.keys.push(Key { name: name.to_string(), code, has_param });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Exact match wins; otherwise a prefix of exactly one keyword.
    pub fn find(&self, token: &str) -> KeyMatch<'_> {
        if let Some(k) = self.keys.iter().find(|k| k.name == token) {
            return KeyMatch::Found(k);
        }

        let mut found = None;
        for k in self.keys.iter().filter(|k| k.name.starts_with(token)) {
            if found.is_some() {
                return KeyMatch::Ambiguous;
            }
            found = Some(k);
        }
        found.map_or(KeyMatch::NotFound, KeyMatch::Found)
    }

    /// Other keywords sharing `key`'s code, in table order.
    pub(crate) fn aliases<'a>(&'a self, key: &'a Key) -> impl Iterator<Item = &'a Key> {
        self.keys
            .iter()
            .filter(move |k| k.code == key.code && !std::ptr::eq(*k, key))
    }
}
