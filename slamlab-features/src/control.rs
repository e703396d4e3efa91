/// Lowe ratio threshold, kept in tenths so repeated steps stay exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AcceptRatio(u8);

impl AcceptRatio {
    pub const MAX_TENTHS: u8 = 10;

    pub fn from_tenths(tenths: u8) -> Self {
        Self(tenths.min(Self::MAX_TENTHS))
    }

    pub fn tenths(self) -> u8 {
        self.0
    }

    pub fn value(self) -> f32 {
        self.0 as f32 / 10.0
    }

    pub fn increase(&mut self) {
        self.0 = (self.0 + 1).min(Self::MAX_TENTHS);
    }

    pub fn decrease(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }
}

impl Default for AcceptRatio {
    fn default() -> Self {
        Self(5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    RebindReference,
    IncreaseRatio,
    DecreaseRatio,
    Quit,
}

impl KeyCommand {
    /// Maps a raw key code as returned by the window key poll; negative means no key.
    pub fn from_key(key: i32) -> Option<Self> {
        if key < 0 {
            return None;
        }
        match ((key & 0xff) as u8).to_ascii_lowercase() {
            b'f' => Some(KeyCommand::RebindReference),
            b'u' => Some(KeyCommand::IncreaseRatio),
            b'd' => Some(KeyCommand::DecreaseRatio),
            b'q' => Some(KeyCommand::Quit),
            _ => None,
        }
    }
}
