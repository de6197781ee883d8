use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic category an uploaded file is classified into.
///
/// Closed enum so dispatch over groups is exhaustive at compile time;
/// adding a group forces every `match` to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "upload_group", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Images,
    Docs,
    Videos,
    Tmp,
}

impl Group {
    /// The bucket primary objects of this group are stored in.
    pub fn bucket(&self) -> Bucket {
        match self {
            Group::Images => Bucket::Images,
            Group::Docs => Bucket::Docs,
            Group::Videos => Bucket::Videos,
            Group::Tmp => Bucket::Tmp,
        }
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Group::Images => write!(f, "images"),
            Group::Docs => write!(f, "docs"),
            Group::Videos => write!(f, "videos"),
            Group::Tmp => write!(f, "tmp"),
        }
    }
}

impl FromStr for Group {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "images" => Ok(Group::Images),
            "docs" => Ok(Group::Docs),
            "videos" => Ok(Group::Videos),
            "tmp" => Ok(Group::Tmp),
            _ => Err(anyhow::anyhow!("Invalid upload group: {}", s)),
        }
    }
}

/// Storage-layout counterpart of [`Group`].
///
/// Kept as a separate type because buckets carry storage concerns (name
/// table, temporary flag) that groups do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Images,
    Docs,
    Videos,
    Tmp,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Images, Bucket::Docs, Bucket::Videos, Bucket::Tmp];
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Bucket::Images => write!(f, "images"),
            Bucket::Docs => write!(f, "docs"),
            Bucket::Videos => write!(f, "videos"),
            Bucket::Tmp => write!(f, "tmp"),
        }
    }
}
