#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

pub type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    /// Filled circle; `spoke` draws a radius line showing the rotation.
    Disc { radius: f32, spoke: bool },
    Ring { radius: f32 },
    Frame { half_extent: f32 },
    Label { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualStyle {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f32,
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: Some([0, 0, 0, 255]),
            stroke_width: 2.0,
        }
    }
}

/// Everything needed to draw one node. Positions are in render space: origin at the
/// arena centre, Y growing downward.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualDesc {
    pub kind: VisualKind,
    pub style: VisualStyle,
    pub position: Vec2,
    pub rotation_radians: f32,
    pub visible: bool,
}

impl VisualDesc {
    pub fn new(kind: VisualKind, style: VisualStyle) -> Self {
        Self {
            kind,
            style,
            position: Vec2::default(),
            rotation_radians: 0.0,
            visible: true,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }
}

/// Retained-mode capability the client drives. Draw order is creation order until a
/// node is promoted with `raise_to_top`.
pub trait VisualBackend {
    fn create_visual(&mut self, desc: VisualDesc) -> VisualId;
    fn update_visual(&mut self, id: VisualId, desc: VisualDesc);
    fn remove_visual(&mut self, id: VisualId);
    fn raise_to_top(&mut self, id: VisualId);
}

/// Immediate-mode shapes redrawn every frame with no retained identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImmediateShape {
    Dot { center: Vec2, radius: f32, color: Rgba },
}

#[derive(Debug, Default)]
struct VisualIdAllocator {
    next: u64,
}

impl VisualIdAllocator {
    fn allocate(&mut self) -> VisualId {
        let id = VisualId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone)]
pub struct StageNode {
    pub id: VisualId,
    pub desc: VisualDesc,
}

#[derive(Debug, Default)]
pub struct Stage {
    allocator: VisualIdAllocator,
    nodes: Vec<StageNode>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in draw order, back to front.
    pub fn nodes(&self) -> &[StageNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find(&self, id: VisualId) -> Option<&VisualDesc> {
        self.nodes
            .iter()
            .find(|node| node.id == id)
            .map(|node| &node.desc)
    }

    pub fn draw_index(&self, id: VisualId) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }
}

impl VisualBackend for Stage {
    fn create_visual(&mut self, desc: VisualDesc) -> VisualId {
        let id = self.allocator.allocate();
        self.nodes.push(StageNode { id, desc });
        id
    }

    fn update_visual(&mut self, id: VisualId, desc: VisualDesc) {
        if let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) {
            node.desc = desc;
        }
    }

    fn remove_visual(&mut self, id: VisualId) {
        self.nodes.retain(|node| node.id != id);
    }

    fn raise_to_top(&mut self, id: VisualId) {
        let Some(index) = self.draw_index(id) else {
            return;
        };
        if index + 1 == self.nodes.len() {
            return;
        }
        let node = self.nodes.remove(index);
        self.nodes.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc(radius: f32) -> VisualDesc {
        VisualDesc::new(
            VisualKind::Disc {
                radius,
                spoke: false,
            },
            VisualStyle::default(),
        )
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut stage = Stage::new();
        let first = stage.create_visual(disc(1.0));
        stage.remove_visual(first);
        let second = stage.create_visual(disc(1.0));
        assert_ne!(first, second);
        assert_eq!(stage.node_count(), 1);
    }

    #[test]
    fn update_replaces_desc_in_place() {
        let mut stage = Stage::new();
        let a = stage.create_visual(disc(1.0));
        let b = stage.create_visual(disc(2.0));
        stage.update_visual(a, disc(5.0).at(Vec2 { x: 3.0, y: -4.0 }));

        assert_eq!(stage.draw_index(a), Some(0));
        assert_eq!(stage.draw_index(b), Some(1));
        let desc = stage.find(a).expect("node a");
        assert_eq!(desc.position, Vec2 { x: 3.0, y: -4.0 });
        assert_eq!(
            desc.kind,
            VisualKind::Disc {
                radius: 5.0,
                spoke: false
            }
        );
    }

    #[test]
    fn raise_to_top_moves_node_last_in_draw_order() {
        let mut stage = Stage::new();
        let a = stage.create_visual(disc(1.0));
        let b = stage.create_visual(disc(1.0));
        let c = stage.create_visual(disc(1.0));
        stage.raise_to_top(a);
        let order: Vec<VisualId> = stage.nodes().iter().map(|node| node.id).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut stage = Stage::new();
        let a = stage.create_visual(disc(1.0));
        stage.update_visual(VisualId(99), disc(9.0));
        stage.remove_visual(VisualId(99));
        stage.raise_to_top(VisualId(99));
        assert_eq!(stage.node_count(), 1);
        assert_eq!(stage.find(a), Some(&disc(1.0)));
    }
}
