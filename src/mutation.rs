use rand::Rng;

use crate::scene::{Scene, Triangle};

/// the seven mutation families, drawn from a 13-slot weighted distribution:
/// three slots each for vertex-x, vertex-y and color channel, one slot each
/// for opacity, swap, insert and remove.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    VertexX,
    VertexY,
    ColorChannel,
    Opacity,
    Swap,
    Insert,
    Remove,
}

pub(crate) const ALL_KINDS: [MutationKind; 7] = [
    MutationKind::VertexX,
    MutationKind::VertexY,
    MutationKind::ColorChannel,
    MutationKind::Opacity,
    MutationKind::Swap,
    MutationKind::Insert,
    MutationKind::Remove,
];

impl MutationKind {
    #[inline]
    pub fn weight(self) -> u32 {
        match self {
            MutationKind::VertexX | MutationKind::VertexY | MutationKind::ColorChannel => 3,
            _ => 1,
        }
    }

    /// size-based legality: swap requires at least 5 triangles, insert must
    /// keep the scene at or below target_count + 1 after appending, the rest
    /// need one triangle to act on.
    #[inline]
    pub fn legal(self, len: usize, target_count: usize) -> bool {
        match self {
            MutationKind::Swap => len >= 5,
            MutationKind::Insert => len <= target_count,
            _ => len >= 1,
        }
    }

    /// weighted draw over the kinds legal at the current scene size. an empty
    /// scene can only grow, so insert is forced there. legality is fixed for
    /// the duration of the draw, so one renormalized weighted pick matches
    /// rerolling a flat 13-slot draw until it lands on a legal kind.
    pub(crate) fn sample<R: Rng>(rng: &mut R, len: usize, target_count: usize) -> Self {
        if len == 0 {
            return MutationKind::Insert;
        }
        let total: u32 = ALL_KINDS
            .iter()
            .filter(|k| k.legal(len, target_count))
            .map(|k| k.weight())
            .sum();
        let mut roll = rng.random_range(0..total);
        for kind in ALL_KINDS {
            if !kind.legal(len, target_count) {
                continue;
            }
            let w = kind.weight();
            if roll < w {
                return kind;
            }
            roll -= w;
        }
        // remove is legal whenever len >= 1, so the cascade cannot fall through
        unreachable!("weighted cascade exhausted")
    }
}

/// undo record for one applied mutation. applying it exactly once, with no
/// other mutation interleaved, restores the scene bit-for-bit; consuming
/// `self` makes a second undo unrepresentable.
#[derive(Debug)]
pub(crate) enum Inverse {
    VertexX { tri: usize, vert: usize, prev: i32 },
    VertexY { tri: usize, vert: usize, prev: i32 },
    ColorChannel { tri: usize, channel: usize, prev: f32 },
    Opacity { tri: usize, prev: f32 },
    Swap { a: usize, b: usize },
    // the inserted triangle sits at the end; undo pops it
    Insert,
    // undo re-inserts the removed triangle at its old index, preserving order
    Remove { index: usize, tri: Triangle },
}

impl Inverse {
    pub(crate) fn apply(self, scene: &mut Scene) {
        match self {
            Inverse::VertexX { tri, vert, prev } => scene.tris[tri].verts[vert].0 = prev,
            Inverse::VertexY { tri, vert, prev } => scene.tris[tri].verts[vert].1 = prev,
            Inverse::ColorChannel { tri, channel, prev } => scene.tris[tri].rgb[channel] = prev,
            Inverse::Opacity { tri, prev } => scene.tris[tri].opacity = prev,
            Inverse::Swap { a, b } => scene.tris.swap(a, b),
            Inverse::Insert => {
                let popped = scene.tris.pop();
                debug_assert!(popped.is_some(), "undo of insert on an empty scene");
            }
            Inverse::Remove { index, tri } => scene.tris.insert(index, tri),
        }
    }
}

/// apply one randomly parameterized mutation of the given kind and return
/// the record that restores the previous state. the caller guarantees `kind`
/// is legal at the current scene size.
pub(crate) fn mutate<R: Rng>(
    scene: &mut Scene,
    kind: MutationKind,
    width: u32,
    height: u32,
    rng: &mut R,
) -> Inverse {
    match kind {
        MutationKind::VertexX => {
            let tri = rng.random_range(0..scene.len());
            let vert = rng.random_range(0..3);
            let slot = &mut scene.tris[tri].verts[vert].0;
            let prev = *slot;
            *slot = rng.random_range(0..width as i32);
            Inverse::VertexX { tri, vert, prev }
        }
        MutationKind::VertexY => {
            let tri = rng.random_range(0..scene.len());
            let vert = rng.random_range(0..3);
            let slot = &mut scene.tris[tri].verts[vert].1;
            let prev = *slot;
            *slot = rng.random_range(0..height as i32);
            Inverse::VertexY { tri, vert, prev }
        }
        MutationKind::ColorChannel => {
            let tri = rng.random_range(0..scene.len());
            let channel = rng.random_range(0..3);
            let prev = scene.tris[tri].rgb[channel];
            scene.tris[tri].rgb[channel] = rng.random();
            Inverse::ColorChannel { tri, channel, prev }
        }
        MutationKind::Opacity => {
            let tri = rng.random_range(0..scene.len());
            let prev = scene.tris[tri].opacity;
            scene.tris[tri].opacity = rng.random();
            Inverse::Opacity { tri, prev }
        }
        MutationKind::Swap => {
            let a = rng.random_range(0..scene.len());
            let b = rng.random_range(0..scene.len()); // may equal a; harmless no-op
            scene.tris.swap(a, b);
            Inverse::Swap { a, b }
        }
        MutationKind::Insert => {
            scene.tris.push(Triangle::random(rng, width, height));
            Inverse::Insert
        }
        MutationKind::Remove => {
            let index = rng.random_range(0..scene.len());
            let tri = scene.tris.remove(index);
            Inverse::Remove { index, tri }
        }
    }
}
