//! Node payloads of the schedule tree.
//!
//! Every node carries exactly one [`ScheduleElem`]. Filter and mapping
//! filter share [`FilterElem`]; a mapping filter is a filter whose
//! `mapping_ids` is `Some`, so code that only cares about the filter set
//! goes through [`ScheduleElem::as_filter`] and handles both.

use crate::polyhedral::{IntegerSet, MultiUnionPwAff, UnionMap, UnionSet};
use crate::schedule::mapping::MappingId;
use crate::utils::pretty::{format_flags, format_list};
use std::collections::BTreeSet;
use std::fmt;

/// The kind of a schedule tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Domain,
    Context,
    Filter,
    MappingFilter,
    Band,
    Sequence,
    Extension,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Domain => "domain",
            NodeType::Context => "context",
            NodeType::Filter => "filter",
            NodeType::MappingFilter => "mapping_filter",
            NodeType::Band => "band",
            NodeType::Sequence => "sequence",
            NodeType::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// Filter payload, shared by plain and mapping filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterElem {
    /// Statement instances that stay active below the node
    pub filter: UnionSet,
    /// Hardware-mapping labels; `Some` marks a mapping filter
    pub mapping_ids: Option<BTreeSet<MappingId>>,
}

impl FilterElem {
    pub fn new(filter: UnionSet) -> Self {
        Self { filter, mapping_ids: None }
    }

    pub fn mapping(filter: UnionSet, ids: BTreeSet<MappingId>) -> Self {
        Self { filter, mapping_ids: Some(ids) }
    }

    pub fn is_mapping(&self) -> bool {
        self.mapping_ids.is_some()
    }
}

/// A band of `n_member` nested schedule dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandElem {
    /// One schedule coordinate per member
    pub mupa: MultiUnionPwAff,
    /// Members may be reordered or tiled
    pub permutable: bool,
    /// Per-member parallelism flags
    pub coincident: Vec<bool>,
    /// Per-member unroll requests
    pub unroll: Vec<bool>,
}

impl BandElem {
    /// A non-permutable band with all member flags cleared.
    pub fn from_mupa(mupa: MultiUnionPwAff) -> Self {
        let n = mupa.n_member();
        Self { mupa, permutable: false, coincident: vec![false; n], unroll: vec![false; n] }
    }

    pub fn new(mupa: MultiUnionPwAff, permutable: bool, coincident: Vec<bool>, unroll: Vec<bool>) -> Self {
        assert_eq!(coincident.len(), mupa.n_member(), "coincident flags do not match band members");
        assert_eq!(unroll.len(), mupa.n_member(), "unroll flags do not match band members");
        Self { mupa, permutable, coincident, unroll }
    }

    pub fn with_permutable(mut self, permutable: bool) -> Self {
        self.permutable = permutable;
        self
    }

    pub fn n_member(&self) -> usize {
        self.mupa.n_member()
    }

    /// Remove members `first..first + n` together with their flags.
    pub fn drop(&mut self, first: usize, n: usize) {
        self.mupa = self.mupa.drop_members(first, n);
        self.coincident.drain(first..first + n);
        self.unroll.drain(first..first + n);
    }
}

/// Payload of a schedule tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleElem {
    Domain(UnionSet),
    Context(IntegerSet),
    Filter(FilterElem),
    Band(BandElem),
    Sequence,
    Extension(UnionMap),
}

impl ScheduleElem {
    pub fn node_type(&self) -> NodeType {
        match self {
            ScheduleElem::Domain(_) => NodeType::Domain,
            ScheduleElem::Context(_) => NodeType::Context,
            ScheduleElem::Filter(f) if f.is_mapping() => NodeType::MappingFilter,
            ScheduleElem::Filter(_) => NodeType::Filter,
            ScheduleElem::Band(_) => NodeType::Band,
            ScheduleElem::Sequence => NodeType::Sequence,
            ScheduleElem::Extension(_) => NodeType::Extension,
        }
    }

    pub fn as_domain(&self) -> Option<&UnionSet> {
        match self {
            ScheduleElem::Domain(domain) => Some(domain),
            _ => None,
        }
    }

    pub fn as_context_mut(&mut self) -> Option<&mut IntegerSet> {
        match self {
            ScheduleElem::Context(context) => Some(context),
            _ => None,
        }
    }

    /// Filter payload of a plain or mapping filter.
    pub fn as_filter(&self) -> Option<&FilterElem> {
        match self {
            ScheduleElem::Filter(filter) => Some(filter),
            _ => None,
        }
    }

    pub fn as_filter_mut(&mut self) -> Option<&mut FilterElem> {
        match self {
            ScheduleElem::Filter(filter) => Some(filter),
            _ => None,
        }
    }

    /// Filter payload of a mapping filter only.
    pub fn as_mapping_filter(&self) -> Option<&FilterElem> {
        self.as_filter().filter(|f| f.is_mapping())
    }

    pub fn as_band(&self) -> Option<&BandElem> {
        match self {
            ScheduleElem::Band(band) => Some(band),
            _ => None,
        }
    }

    pub fn as_band_mut(&mut self) -> Option<&mut BandElem> {
        match self {
            ScheduleElem::Band(band) => Some(band),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&UnionMap> {
        match self {
            ScheduleElem::Extension(extension) => Some(extension),
            _ => None,
        }
    }

    pub fn as_extension_mut(&mut self) -> Option<&mut UnionMap> {
        match self {
            ScheduleElem::Extension(extension) => Some(extension),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ScheduleElem::Sequence)
    }
}

impl fmt::Display for ScheduleElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleElem::Domain(domain) => write!(f, "domain: {}", domain),
            ScheduleElem::Context(context) => write!(f, "context: {}", context),
            ScheduleElem::Filter(FilterElem { filter, mapping_ids: None }) => {
                write!(f, "filter: {}", filter)
            }
            ScheduleElem::Filter(FilterElem { filter, mapping_ids: Some(ids) }) => {
                let ids: Vec<&MappingId> = ids.iter().collect();
                write!(f, "mapping_filter(ids: {}): {}", format_list(&ids, ", "), filter)
            }
            ScheduleElem::Band(band) => write!(
                f,
                "band(n: {}, permutable: {}, coincident: {}, unroll: {}): {}",
                band.n_member(),
                u8::from(band.permutable),
                format_flags(&band.coincident),
                format_flags(&band.unroll),
                band.mupa,
            ),
            ScheduleElem::Sequence => write!(f, "sequence"),
            ScheduleElem::Extension(extension) => write!(f, "extension: {}", extension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::AffineExpr;
    use crate::utils::Id;

    #[test]
    fn test_band_drop_keeps_flags_aligned() {
        let dom = UnionSet::rectangular(Id::new("A"), &[2, 2]);
        let mupa = MultiUnionPwAff::from_affine(&dom, &AffineExpr::identity(2));
        let mut band = BandElem::new(mupa, true, vec![true, false], vec![false, true]);
        band.drop(0, 1);
        assert_eq!(band.n_member(), 1);
        assert_eq!(band.coincident, vec![false]);
        assert_eq!(band.unroll, vec![true]);
    }

    #[test]
    fn test_mapping_filter_is_a_filter() {
        let set = UnionSet::rectangular(Id::new("A"), &[2]);
        let ids: BTreeSet<MappingId> = [MappingId::block(0)].into_iter().collect();
        let elem = ScheduleElem::Filter(FilterElem::mapping(set.clone(), ids));
        assert_eq!(elem.node_type(), NodeType::MappingFilter);
        assert_eq!(elem.as_filter().map(|f| &f.filter), Some(&set));
        assert!(elem.as_mapping_filter().is_some());

        let plain = ScheduleElem::Filter(FilterElem::new(set));
        assert_eq!(plain.node_type(), NodeType::Filter);
        assert!(plain.as_mapping_filter().is_none());
    }

    #[test]
    fn test_display() {
        let dom = UnionSet::rectangular(Id::new("A"), &[2]);
        let band = BandElem::from_mupa(MultiUnionPwAff::from_affine(&dom, &AffineExpr::identity(1)));
        assert_eq!(
            ScheduleElem::Band(band).to_string(),
            "band(n: 1, permutable: 0, coincident: [0], unroll: [0]): { A[0] -> [0]; A[1] -> [1] }"
        );
        assert_eq!(NodeType::MappingFilter.to_string(), "mapping_filter");
    }
}
