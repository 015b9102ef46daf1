use crate::error::{CodecResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OBJECT IDENTIFIER as a list of numeric arcs
///
/// Always holds at least two arcs; the first is 0, 1 or 2 and, when the first
/// is 0 or 1, the second is below 40. Those are the conditions under which
/// the first two arcs can be packed into a single `40 * first + second`
/// subidentifier on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawObjectIdentifier")]
pub struct ObjectIdentifier {
    arcs: Vec<u64>,
}

#[derive(Deserialize)]
struct RawObjectIdentifier {
    arcs: Vec<u64>,
}

impl TryFrom<RawObjectIdentifier> for ObjectIdentifier {
    type Error = ErrorKind;

    fn try_from(raw: RawObjectIdentifier) -> Result<Self, Self::Error> {
        Self::new(raw.arcs)
    }
}

impl ObjectIdentifier {
    /// Create an object identifier from its arcs
    pub fn new(arcs: Vec<u64>) -> CodecResult<Self> {
        if arcs.len() < 2 {
            return Err(ErrorKind::MalformedObjectIdentifier(
                "at least two arcs are required".to_string(),
            ));
        }
        if arcs[0] > 2 {
            return Err(ErrorKind::MalformedObjectIdentifier(format!(
                "first arc must be 0, 1 or 2, got {}",
                arcs[0]
            )));
        }
        if arcs[0] < 2 && arcs[1] >= 40 {
            return Err(ErrorKind::MalformedObjectIdentifier(format!(
                "second arc must be below 40 under arc {}, got {}",
                arcs[0], arcs[1]
            )));
        }

        Ok(Self { arcs })
    }

    /// Parse the dotted form, e.g. `"1.2.840.113549"`
    pub fn from_dotted(s: &str) -> CodecResult<Self> {
        let arcs = s
            .split('.')
            .map(|part| part.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                ErrorKind::MalformedObjectIdentifier(format!("invalid dotted form `{}`", s))
            })?;
        Self::new(arcs)
    }

    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    pub fn to_dotted(&self) -> String {
        self.to_string()
    }
}

impl FromStr for ObjectIdentifier {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dotted(s)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_from_dotted() {
        let oid: ObjectIdentifier = "1.2.398.3.10.1.1.1.2.2".parse().unwrap();
        assert_eq!(oid.arcs(), &[1, 2, 398, 3, 10, 1, 1, 1, 2, 2]);
        assert_eq!(oid.to_dotted(), "1.2.398.3.10.1.1.1.2.2");
    }

    #[test]
    fn test_oid_rejects_bad_arcs() {
        assert!(ObjectIdentifier::new(vec![1]).is_err());
        assert!(ObjectIdentifier::new(vec![3, 1]).is_err());
        assert!(ObjectIdentifier::new(vec![1, 40]).is_err());
        assert!(ObjectIdentifier::new(vec![2, 999]).is_ok());
        assert!(ObjectIdentifier::from_dotted("1.2.x").is_err());
        assert!(ObjectIdentifier::from_dotted("").is_err());
    }

    #[test]
    fn test_oid_deserialize_validates() {
        let oid = ObjectIdentifier::from_dotted("2.5.4.3").unwrap();
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, r#"{"arcs":[2,5,4,3]}"#);
        assert_eq!(serde_json::from_str::<ObjectIdentifier>(&json).unwrap(), oid);

        assert!(serde_json::from_str::<ObjectIdentifier>(r#"{"arcs":[]}"#).is_err());
        assert!(serde_json::from_str::<ObjectIdentifier>(r#"{"arcs":[1]}"#).is_err());
        assert!(serde_json::from_str::<ObjectIdentifier>(r#"{"arcs":[1,40]}"#).is_err());
    }
}
