use serde::Serialize;

/// Named stacking layers every map gets, lowest first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum PaneKind {
    BoundingBox,
    Parent,
    Polygon,
    Centroids,
    Tooltips,
}

impl PaneKind {
    /// Creation order. Strictly increasing z-index.
    pub const ALL: [PaneKind; 5] = [
        PaneKind::BoundingBox,
        PaneKind::Parent,
        PaneKind::Polygon,
        PaneKind::Centroids,
        PaneKind::Tooltips,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaneKind::BoundingBox => "bbox",
            PaneKind::Parent => "parent",
            PaneKind::Polygon => "polygon",
            PaneKind::Centroids => "centroids",
            PaneKind::Tooltips => "tooltips",
        }
    }

    pub fn z_index(self) -> u32 {
        match self {
            PaneKind::BoundingBox => 1000,
            PaneKind::Parent => 2000,
            PaneKind::Polygon => 3000,
            PaneKind::Centroids => 4000,
            // Directly above the markers they label.
            PaneKind::Tooltips => 4001,
        }
    }
}

impl From<PaneKind> for &'static str {
    fn from(p: PaneKind) -> Self {
        p.name()
    }
}

#[cfg(test)]
mod tests {
    use super::PaneKind;

    #[test]
    fn panes_are_strictly_ordered() {
        let z: Vec<u32> = PaneKind::ALL.iter().map(|p| p.z_index()).collect();
        assert_eq!(z, vec![1000, 2000, 3000, 4000, 4001]);
        assert!(PaneKind::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn serializes_as_pane_name() {
        assert_eq!(
            serde_json::to_string(&PaneKind::BoundingBox).unwrap(),
            "\"bbox\""
        );
    }
}
