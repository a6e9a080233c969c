//! Solver parameters and the `-ex key value` override surface.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::geometry::Orientation;
use crate::grid::StoneId;

pub const DEFAULT_BEAM_WIDTH: usize = 100;
pub const DEFAULT_WEIGHT_DIFF_ID: i32 = 5;
pub const DEFAULT_HASH_SEED: u64 = 5489;

/// Direction of the id-ordering adjacency rule.
///
/// With `Ascending`, every stone after the first must touch a stone with a
/// smaller id; with `Descending`, a stone with a larger id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementOrder {
    #[default]
    Ascending,
    Descending,
}

impl PlacementOrder {
    /// Returns true if a neighbour `neighbor` lets `stone` be placed next to it.
    #[inline(always)]
    pub fn precedes(self, neighbor: StoneId, stone: StoneId) -> bool {
        match self {
            Self::Ascending => neighbor < stone,
            Self::Descending => neighbor > stone,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// States kept per empty-count bucket.
    pub beam_width: usize,
    /// Penalty per unit of id gap between a stone and its preceding neighbour.
    pub weight_diff_id: i32,
    pub order: PlacementOrder,
    /// Starting board orientations, each searched independently.
    pub orientations: Vec<Orientation>,
    /// Run orientations on the rayon thread pool.
    pub parallel: bool,
    /// Wall-clock budget, checked before each bucket.
    pub time_limit: Option<Duration>,
    /// Directory receiving an answer file each time the best result improves.
    pub snapshot_dir: Option<PathBuf>,
    pub hash_seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            weight_diff_id: DEFAULT_WEIGHT_DIFF_ID,
            order: PlacementOrder::Ascending,
            orientations: Orientation::ALL.to_vec(),
            parallel: cfg!(feature = "rayon"),
            time_limit: None,
            snapshot_dir: None,
            hash_seed: DEFAULT_HASH_SEED,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::BadOption {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        _ => Err(Error::BadOption {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl SolverConfig {
    /// Applies `-ex` style overrides.
    ///
    /// | key | field |
    /// |---|---|
    /// | `w` | `weight_diff_id` |
    /// | `b` | `beam_width` |
    /// | `r` | `order` (`1` = descending) |
    /// | `t` | `orientations`, comma separated indices |
    /// | `p` | `parallel` |
    /// | `time` | `time_limit` in milliseconds |
    /// | `snap` | `snapshot_dir` |
    /// | `seed` | `hash_seed` |
    ///
    /// Unknown keys are logged and skipped.
    pub fn apply_extra<'a, I>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in pairs {
            match key {
                "w" => self.weight_diff_id = parse_value(key, value)?,
                "b" => {
                    let width: usize = parse_value(key, value)?;
                    if width == 0 {
                        return Err(Error::BadOption {
                            key: key.to_string(),
                            value: value.to_string(),
                        });
                    }
                    self.beam_width = width;
                }
                "r" => {
                    self.order = if parse_flag(key, value)? {
                        PlacementOrder::Descending
                    } else {
                        PlacementOrder::Ascending
                    }
                }
                "t" => {
                    self.orientations = value
                        .split(',')
                        .map(|index| {
                            parse_value::<u8>(key, index.trim())
                                .and_then(|i| Orientation::new(i).ok_or(Error::BadOption {
                                    key: key.to_string(),
                                    value: value.to_string(),
                                }))
                        })
                        .collect::<Result<_>>()?;
                }
                "p" => self.parallel = parse_flag(key, value)?,
                "time" => {
                    self.time_limit = Some(Duration::from_millis(parse_value(key, value)?))
                }
                "snap" => self.snapshot_dir = Some(PathBuf::from(value)),
                "seed" => self.hash_seed = parse_value(key, value)?,
                _ => {
                    log::warn!("ignoring unknown option {key:?} = {value:?}");
                    continue;
                }
            }
            log::info!("option {key} = {value}");
        }
        Ok(())
    }
}
