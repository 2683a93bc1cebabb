//! Benchmark configurations and the keys results are filed under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stencil shapes understood by the solver, by their numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StencilShape {
    Star = 0,
    Box = 1,
    StarFill1 = 2,
    Diamond = 3,
}

impl StencilShape {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StencilShape::Star => "stencilstar",
            StencilShape::Box => "stencilbox",
            StencilShape::StarFill1 => "stencilstarfill1",
            StencilShape::Diamond => "stencildiamond",
        }
    }
}

impl fmt::Display for StencilShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One benchmark variant: stencil shape, stencil width and unknowns per
/// grid point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Configuration {
    pub shape: StencilShape,
    pub width: u32,
    pub dof: u32,
}

impl Configuration {
    pub fn new(shape: StencilShape, width: u32, dof: u32) -> Self {
        Self { shape, width, dof }
    }

    /// Outer results key, e.g. `stencilstar,width=1`. Depends only on
    /// shape and width.
    pub fn descriptor(&self) -> String {
        problem_descriptor(self.shape, self.width)
    }

    /// Inner results key, e.g. `dof=4`.
    pub fn dof_label(&self) -> String {
        format!("dof={}", self.dof)
    }

    /// Positional arguments for the solver: shape id, width, dof, then the
    /// three mesh dimensions.
    pub fn solver_args(&self, mesh: MeshSize) -> Vec<String> {
        let [x, y, z] = mesh.dims();
        vec![
            self.shape.id().to_string(),
            self.width.to_string(),
            self.dof.to_string(),
            x.to_string(),
            y.to_string(),
            z.to_string(),
        ]
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.descriptor(), self.dof_label())
    }
}

pub fn problem_descriptor(shape: StencilShape, width: u32) -> String {
    format!("{},width={}", shape.as_str(), width)
}

/// Grid dimensions handed to the solver. Always cubic in practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshSize([u32; 3]);

impl MeshSize {
    pub fn cube(k: u32) -> Self {
        Self([k, k, k])
    }

    pub fn dims(&self) -> [u32; 3] {
        self.0
    }

    pub fn points(&self) -> u64 {
        self.0.iter().map(|&d| d as u64).product()
    }
}

impl fmt::Display for MeshSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "{}x{}x{}", x, y, z)
    }
}

/// The five (shape, width) problems every strategy walks, in table-row
/// order.
pub const PROBLEMS: [(StencilShape, u32); 5] = [
    (StencilShape::Star, 0),
    (StencilShape::Star, 1),
    (StencilShape::Box, 0),
    (StencilShape::StarFill1, 0),
    (StencilShape::Diamond, 1),
];

/// Degrees of freedom explored by capacity search.
pub const SEARCH_DOFS: [u32; 2] = [1, 4];

/// Degrees of freedom covered by the fixed sweep, one per table column.
pub const SWEEP_DOFS: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

/// Capacity search configurations: all five problems at dof 1, then at
/// dof 4.
pub fn search_configurations() -> Vec<Configuration> {
    SEARCH_DOFS
        .iter()
        .flat_map(|&dof| {
            PROBLEMS
                .iter()
                .map(move |&(shape, width)| Configuration::new(shape, width, dof))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_depends_only_on_shape_and_width() {
        let a = Configuration::new(StencilShape::Star, 1, 1);
        let b = Configuration::new(StencilShape::Star, 1, 4);
        assert_eq!(a.descriptor(), "stencilstar,width=1");
        assert_eq!(a.descriptor(), b.descriptor());
        assert_ne!(
            a.descriptor(),
            Configuration::new(StencilShape::Star, 0, 1).descriptor()
        );
        assert_eq!(
            Configuration::new(StencilShape::StarFill1, 0, 2).descriptor(),
            "stencilstarfill1,width=0"
        );
    }

    #[test]
    fn dof_label_format() {
        assert_eq!(
            Configuration::new(StencilShape::Box, 0, 8).dof_label(),
            "dof=8"
        );
    }

    #[test]
    fn solver_args_follow_positional_contract() {
        let cfg = Configuration::new(StencilShape::Diamond, 1, 4);
        assert_eq!(
            cfg.solver_args(MeshSize::cube(48)),
            vec!["3", "1", "4", "48", "48", "48"]
        );
    }

    #[test]
    fn search_configurations_cover_both_dofs_in_order() {
        let configs = search_configurations();
        assert_eq!(configs.len(), 10);
        assert!(configs[..5].iter().all(|c| c.dof == 1));
        assert!(configs[5..].iter().all(|c| c.dof == 4));
        assert_eq!(configs[0], Configuration::new(StencilShape::Star, 0, 1));
        assert_eq!(configs[9], Configuration::new(StencilShape::Diamond, 1, 4));
    }

    #[test]
    fn mesh_points_do_not_overflow_u32() {
        assert_eq!(MeshSize::cube(1296).points(), 2_176_782_336);
        assert_eq!(MeshSize::cube(32).to_string(), "32x32x32");
    }
}
