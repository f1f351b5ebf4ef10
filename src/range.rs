use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PhotoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Stop {
    #[default]
    All,
    At(usize),
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::All => write!(f, "ALL"),
            Stop::At(index) => write!(f, "{index}"),
        }
    }
}

impl FromStr for Stop {
    type Err = PhotoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Stop::All);
        }
        trimmed
            .parse::<usize>()
            .map(Stop::At)
            .map_err(|_| PhotoError::InvalidRange(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunRange {
    pub start: usize,
    pub stop: Stop,
}

impl RunRange {
    pub fn new(start: usize, stop: Stop) -> Self {
        Self { start, stop }
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start
            && match self.stop {
                Stop::All => true,
                Stop::At(stop) => position < stop,
            }
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> impl Iterator<Item = (usize, &'a T)> + 'a {
        let range = *self;
        items
            .iter()
            .enumerate()
            .skip(range.start)
            .take_while(move |(position, _)| range.contains(*position))
    }
}
