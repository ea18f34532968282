//! Packages awaiting delivery.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::location::normalise_location;

/// A parcel bound for a single destination.
///
/// # Examples
///
/// ```
/// use haulplan_core::Package;
///
/// # fn main() -> Result<(), haulplan_core::ValidationError> {
/// let package = Package::new(7, "1 Main St")?;
/// assert_eq!(package.id, 7);
/// assert!(package.delivered_at.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Package {
    /// Unique, positive identifier.
    pub id: u64,
    /// Delivery address, used as an opaque identity.
    pub destination: String,
    /// When the package left the hub, once a plan is applied.
    #[cfg_attr(feature = "serde", serde(default))]
    pub loaded_at: Option<DateTime<Utc>>,
    /// Planned arrival at the destination, once a plan is applied.
    #[cfg_attr(feature = "serde", serde(default))]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Package {
    /// Validate and construct an unplanned package.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPackageId`] for a zero id and
    /// [`ValidationError::BlankPackageDestination`] when the destination is
    /// empty after whitespace normalisation.
    pub fn new(id: u64, destination: impl Into<String>) -> Result<Self, ValidationError> {
        if id == 0 {
            return Err(ValidationError::InvalidPackageId { package_id: id });
        }
        let destination = destination.into();
        if normalise_location(&destination).is_empty() {
            return Err(ValidationError::BlankPackageDestination { package_id: id });
        }
        Ok(Self {
            id,
            destination,
            loaded_at: None,
            delivered_at: None,
        })
    }
}

/// Group packages by normalised destination.
///
/// Destinations iterate in ascending order and each group keeps the input
/// order of its packages. The returned packages carry the normalised
/// destination so downstream lookups agree on keys.
///
/// # Errors
///
/// Returns [`ValidationError::BlankPackageDestination`] for the first package
/// whose destination is blank.
pub fn group_by_destination<I>(packages: I) -> Result<BTreeMap<String, Vec<Package>>, ValidationError>
where
    I: IntoIterator<Item = Package>,
{
    let mut grouped: BTreeMap<String, Vec<Package>> = BTreeMap::new();
    for mut package in packages {
        let destination = normalise_location(&package.destination);
        if destination.is_empty() {
            return Err(ValidationError::BlankPackageDestination {
                package_id: package.id,
            });
        }
        package.destination.clone_from(&destination);
        grouped.entry(destination).or_default().push(package);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(id: u64, destination: &str) -> Package {
        Package {
            id,
            destination: destination.to_owned(),
            loaded_at: None,
            delivered_at: None,
        }
    }

    #[rstest]
    #[case(0, "A")]
    #[case(1, "  ")]
    fn new_rejects_invalid_packages(#[case] id: u64, #[case] destination: &str) {
        assert!(Package::new(id, destination).is_err());
    }

    #[rstest]
    fn grouping_merges_whitespace_variants() {
        let grouped = group_by_destination([raw(1, "B  St"), raw(2, "A"), raw(3, " B St")])
            .expect("valid packages");

        let keys: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(keys, vec!["A".to_owned(), "B St".to_owned()]);
        let b_ids: Vec<_> = grouped["B St"].iter().map(|p| p.id).collect();
        assert_eq!(b_ids, vec![1, 3]);
        assert!(grouped["B St"].iter().all(|p| p.destination == "B St"));
    }

    #[rstest]
    fn grouping_rejects_blank_destination() {
        let err = group_by_destination([raw(1, "A"), raw(9, "\t")]).expect_err("blank destination");
        assert_eq!(
            err,
            ValidationError::BlankPackageDestination { package_id: 9 }
        );
    }
}
