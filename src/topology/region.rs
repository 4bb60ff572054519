use super::keys::ShellId;

/// A maximal connected grouping of shells.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub index: u64,
    /// Shells in creation order.
    pub shells: Vec<ShellId>,
}
