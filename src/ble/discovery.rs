//! Device matching for scan results.
//!
//! Scanning itself belongs to the host. These predicates only decide whether
//! an advertisement belongs to a Volcano Hybrid.

use btleplug::api::PeripheralProperties;

use crate::ble::uuids::{STORZ_BICKEL_MANUFACTURER_ID, VOLCANO_NAME_FRAGMENT};

/// Check if an advertisement comes from a supported device.
///
/// Requires the Storz & Bickel manufacturer ID and a local name containing
/// `"VOLCANO H"`.
pub fn is_supported<'a, I>(manufacturer_ids: I, local_name: Option<&str>) -> bool
where
    I: IntoIterator<Item = &'a u16>,
{
    let from_storz_bickel = manufacturer_ids
        .into_iter()
        .any(|id| *id == STORZ_BICKEL_MANUFACTURER_ID);

    from_storz_bickel
        && local_name
            .map(|name| name.contains(VOLCANO_NAME_FRAGMENT))
            .unwrap_or(false)
}

/// Check btleplug peripheral properties against [`is_supported`].
pub fn matches_properties(properties: &PeripheralProperties) -> bool {
    is_supported(
        properties.manufacturer_data.keys(),
        properties.local_name.as_deref(),
    )
}
