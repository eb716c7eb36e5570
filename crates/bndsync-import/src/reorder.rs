use bndsync_host::{HostModule, OrderEntry};

/// Sort key of an order entry: module sources first, SDK last.
pub fn weight(entry: &OrderEntry) -> u8 {
    if entry.is_sdk() {
        2
    } else if entry.is_module_source() {
        0
    } else {
        1
    }
}

/// Stable-sort `module`'s order entries by [`weight`]. Lists of two entries
/// or fewer are left alone.
pub fn reorder(module: &mut HostModule) {
    if module.order_entries.len() <= 2 {
        return;
    }
    let mut entries = module.order_entries.clone();
    entries.sort_by_key(weight);
    module.rearrange_order_entries(entries);
}
