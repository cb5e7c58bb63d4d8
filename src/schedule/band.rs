//! Band editing: split, join, tile and scale.
//!
//! Example (tiling `i` by 4 with point loops shifted):
//! ```text
//! band [i]                      band [floor(i/4)]
//!   child            becomes      band [i - 4*floor(i/4)]
//!                                   child
//! ```

use crate::schedule::tree::{NodeId, ScheduleTree};
use crate::schedule::elem::BandElem;
use crate::utils::{ScheduleError, ScheduleErrorKind, ScheduleResult};
use log::{debug, warn};
use std::ops::BitOr;

/// How [`ScheduleTree::band_tile`] lays out tile and point coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileOptions {
    /// Tile coordinates are `t*floor(i/t)` instead of `floor(i/t)`
    pub scale_tile_loops: bool,
    /// Point coordinates are relative to the tile origin
    pub shift_point_loops: bool,
}

impl TileOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shift_point_loops() -> Self {
        Self { shift_point_loops: true, ..Self::default() }
    }

    pub fn scale_tile_loops() -> Self {
        Self { scale_tile_loops: true, ..Self::default() }
    }

    pub fn with_scale_tile_loops(mut self, enabled: bool) -> Self {
        self.scale_tile_loops = enabled;
        self
    }

    pub fn with_shift_point_loops(mut self, enabled: bool) -> Self {
        self.shift_point_loops = enabled;
        self
    }
}

impl BitOr for TileOptions {
    type Output = TileOptions;

    fn bitor(self, rhs: TileOptions) -> TileOptions {
        TileOptions {
            scale_tile_loops: self.scale_tile_loops || rhs.scale_tile_loops,
            shift_point_loops: self.shift_point_loops || rhs.shift_point_loops,
        }
    }
}

/// Truncate or zero-pad `values` to the band arity.
fn fit_to_band(values: &[i64], n_member: usize, what: &str) -> Vec<i64> {
    if values.len() != n_member {
        warn!("Resizing {} to {} entries: {:?}", what, n_member, values);
    }
    let mut fitted = values.to_vec();
    fitted.resize(n_member, 0);
    fitted
}

fn not_a_band(tree: &ScheduleTree, node: NodeId, operation: &'static str) -> ScheduleError {
    ScheduleError::new(
        ScheduleErrorKind::WrongNodeKind,
        operation,
        format!("not a band: {} is a {}", node, tree.node_type(node)),
    )
}

impl ScheduleTree {
    fn band(&self, node: NodeId, operation: &'static str) -> ScheduleResult<&BandElem> {
        self.elem(node).as_band().ok_or_else(|| not_a_band(self, node, operation))
    }

    fn band_mut(&mut self, node: NodeId, operation: &'static str) -> ScheduleResult<&mut BandElem> {
        if self.elem(node).as_band().is_none() {
            return Err(not_a_band(self, node, operation));
        }
        self.elem_mut(node).as_band_mut().ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::WrongNodeKind, operation, "not a band")
        })
    }

    /// Split and return the inner band.
    fn split_band(&mut self, node: NodeId, pos: usize, operation: &'static str) -> ScheduleResult<NodeId> {
        let band = self.band(node, operation)?;
        let n = band.n_member();
        if n == 0 {
            return Err(ScheduleError::new(ScheduleErrorKind::EmptyBand, operation, "no band members to split"));
        }
        if pos > n {
            return Err(ScheduleError::new(
                ScheduleErrorKind::PositionOutOfBounds,
                operation,
                format!("split position {} out of bounds for a band of {} members", pos, n),
            ));
        }
        let mut inner = band.clone();
        inner.drop(0, pos);

        let children = self.detach_children(node);
        let inner = self.make_band(inner, children);
        let inner_id = self.append_child(node, inner);
        self.band_mut(node, operation)?.drop(pos, n - pos);
        Ok(inner_id)
    }

    /// Split the band at `node` into an outer band with members `[0, pos)`
    /// and an inner band with members `[pos, n)` as its only child. Returns
    /// the outer band.
    pub fn band_split(&mut self, node: NodeId, pos: usize) -> ScheduleResult<NodeId> {
        self.split_band(node, pos, "band_split")?;
        Ok(node)
    }

    /// Isolate member `pos` in a single-member band and return that band.
    pub fn band_split_out(&mut self, node: NodeId, pos: usize) -> ScheduleResult<NodeId> {
        let n = self.band(node, "band_split_out")?.n_member();
        if pos >= n {
            return Err(ScheduleError::new(
                ScheduleErrorKind::PositionOutOfBounds,
                "band_split_out",
                format!("member {} out of bounds for a band of {} members", pos, n),
            ));
        }
        if pos + 1 != n {
            self.split_band(node, pos + 1, "band_split_out")?;
        }
        if pos != 0 {
            return self.split_band(node, pos, "band_split_out");
        }
        Ok(node)
    }

    /// Absorb a single band child into `node`. Returns whether a join happened.
    fn join_bands_helper(&mut self, node: NodeId, operation: &'static str) -> ScheduleResult<bool> {
        self.band(node, operation)?;
        if self.n_children(node) != 1 {
            return Ok(false);
        }
        let child = self.children(node)[0];
        let Some(nested) = self.elem(child).as_band().cloned() else {
            return Ok(false);
        };

        let band = self.band_mut(node, operation)?;
        band.mupa = band.mupa.flat_range_product(&nested.mupa);
        // Coincidence of the nested members only held inside the outer band.
        let n = band.coincident.len() + nested.coincident.len();
        band.coincident.resize(n, false);
        band.unroll.extend(nested.unroll);

        let child = self.detach_child(node, 0)?;
        let grandchildren = self.detach_children(child.id());
        self.discard(child);
        self.append_children(node, grandchildren);
        debug!("joined nested band into {}", node);
        Ok(true)
    }

    /// If the only child of the band at `node` is a band, concatenate its
    /// members onto `node`. The result's permutable flag is `permutable`.
    pub fn join_bands(&mut self, node: NodeId, permutable: bool) -> ScheduleResult<NodeId> {
        self.join_bands_helper(node, "join_bands")?;
        self.band_mut(node, "join_bands")?.permutable = permutable;
        Ok(node)
    }

    /// Repeat [`ScheduleTree::join_bands`] until no single band child is left.
    pub fn join_bands_iterative(&mut self, node: NodeId, permutable: bool) -> ScheduleResult<NodeId> {
        while self.join_bands_helper(node, "join_bands_iterative")? {}
        self.band_mut(node, "join_bands_iterative")?.permutable = permutable;
        Ok(node)
    }

    /// Tile the permutable band at `node`.
    ///
    /// Member `i` of the band becomes `floor(x_i / t_i)` (or `t_i * floor(x_i / t_i)`
    /// with `scale_tile_loops`); a non-positive size leaves the member as is.
    /// A copy of the original band is inserted as the only child, and with
    /// `shift_point_loops` the tile origin is subtracted from it. An empty
    /// size list leaves the band untouched.
    pub fn band_tile(&mut self, node: NodeId, tile_sizes: &[i64], options: TileOptions) -> ScheduleResult<NodeId> {
        let band = self.band(node, "band_tile")?;
        if tile_sizes.is_empty() {
            return Ok(node);
        }
        if !band.permutable {
            return Err(ScheduleError::new(
                ScheduleErrorKind::NonPermutableBand,
                "band_tile",
                format!("can't tile non-permutable band {}", node),
            ));
        }
        let sizes = fit_to_band(tile_sizes, band.n_member(), "tile sizes");
        let mut point = band.clone();

        let mut tile = band.mupa.clone();
        for (i, &t) in sizes.iter().enumerate() {
            if t > 0 {
                let mut upa = tile.member(i).scale_down_floor(t);
                if options.scale_tile_loops {
                    upa = upa.scale(t);
                }
                tile = tile.set_member(i, &upa);
            }
        }

        if options.shift_point_loops {
            let origin = if options.scale_tile_loops {
                tile.clone()
            } else {
                let factors: Vec<i64> = sizes.iter().map(|&t| if t > 0 { t } else { 1 }).collect();
                tile.scale_members(&factors)
            };
            point.mupa = point.mupa.sub(&origin);
        }

        self.band_mut(node, "band_tile")?.mupa = tile;
        let children = self.detach_children(node);
        let point = self.make_band(point, children);
        self.append_child(node, point);
        debug!("tiled band {} with sizes {:?} ({:?})", node, sizes, options);
        Ok(node)
    }

    /// Multiply member `i` by `scales[i]`; a non-positive factor leaves the
    /// member unscaled.
    pub fn band_scale(&mut self, node: NodeId, scales: &[i64]) -> ScheduleResult<NodeId> {
        let band = self.band_mut(node, "band_scale")?;
        let scales = fit_to_band(scales, band.n_member(), "scales");
        let factors: Vec<i64> = scales.iter().map(|&s| if s > 0 { s } else { 1 }).collect();
        band.mupa = band.mupa.scale_members(&factors);
        Ok(node)
    }
}
