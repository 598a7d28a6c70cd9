use crate::demand::PieceBuffer;
use crate::options::SheetOptions;
use crate::types::{MeshDirection, Orientation, PlacedRect, Rect};

/// One rectangle instance waiting to be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPiece {
    pub rect: Rect,
    pub label: String,
    pub mesh: MeshDirection,
}

/// Left-to-right, row-by-row packing of a single sheet.
///
/// The cursor never moves back: a piece that does not fit on the current
/// shelf opens the next one, and pieces skipped here are left for another
/// sheet.
#[derive(Debug, Clone)]
pub struct ShelfBin {
    sheet: Rect,
    x: u32,
    y: u32,
    shelf_h: u32,
    pub placements: Vec<PlacedRect>,
    /// Buffer slots of the placed pieces.
    pub picked: Vec<usize>,
}

impl ShelfBin {
    pub fn new(sheet: Rect) -> Self {
        Self {
            sheet,
            x: 0,
            y: 0,
            shelf_h: 0,
            placements: Vec::new(),
            picked: Vec::new(),
        }
    }

    /// Packs `pieces` in buffer order onto a fresh sheet.
    pub fn pack(sheet: Rect, pieces: &PieceBuffer<SheetPiece>, options: &SheetOptions) -> Self {
        let mut bin = Self::new(sheet);
        for (idx, piece) in pieces.iter() {
            for orientation in [Orientation::A, Orientation::B] {
                if !options.allows(piece.mesh, orientation) {
                    continue;
                }
                if bin.try_place(orientation.apply(piece.rect), &piece.label) {
                    bin.picked.push(idx);
                    break;
                }
            }
        }
        bin
    }

    pub fn used_area(&self) -> u64 {
        self.placements
            .iter()
            .map(|p| Rect::new(p.w, p.h).area())
            .sum()
    }

    pub fn made(&self) -> u32 {
        self.placements.len() as u32
    }

    fn fits_at_cursor(&self, part: Rect) -> bool {
        self.x as u64 + part.w as u64 <= self.sheet.w as u64
            && self.y as u64 + part.h as u64 <= self.sheet.h as u64
    }

    fn next_shelf(&mut self) -> bool {
        if self.y as u64 + self.shelf_h as u64 >= self.sheet.h as u64 {
            return false;
        }
        self.y += self.shelf_h;
        self.x = 0;
        self.shelf_h = 0;
        true
    }

    fn place_at_cursor(&mut self, part: Rect, label: &str) {
        self.placements.push(PlacedRect {
            x: self.x,
            y: self.y,
            w: part.w,
            h: part.h,
            label: label.to_string(),
        });
        self.x += part.w;
        self.shelf_h = self.shelf_h.max(part.h);
    }

    /// Tries the current shelf, then once on a new shelf. A failed second
    /// attempt still leaves the cursor on the new shelf.
    pub fn try_place(&mut self, part: Rect, label: &str) -> bool {
        if self.fits_at_cursor(part) {
            self.place_at_cursor(part, label);
            return true;
        }
        if !self.next_shelf() {
            return false;
        }
        if self.fits_at_cursor(part) {
            self.place_at_cursor(part, label);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(w: u32, h: u32, mesh: MeshDirection) -> SheetPiece {
        SheetPiece {
            rect: Rect::new(w, h),
            label: Rect::new(w, h).to_string(),
            mesh,
        }
    }

    fn assert_inside_no_overlap(sheet: Rect, placements: &[PlacedRect]) {
        for (i, a) in placements.iter().enumerate() {
            assert!(a.x + a.w <= sheet.w, "piece {i} exceeds sheet width");
            assert!(a.y + a.h <= sheet.h, "piece {i} exceeds sheet height");
            for (j, b) in placements.iter().enumerate().skip(i + 1) {
                let overlaps =
                    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h;
                assert!(!overlaps, "piece {i} overlaps piece {j}");
            }
        }
    }

    #[test]
    fn test_fills_row_then_next_shelf() {
        let mut bin = ShelfBin::new(Rect::new(1000, 1000));
        assert!(bin.try_place(Rect::new(600, 300), "a"));
        assert!(bin.try_place(Rect::new(400, 200), "b"));
        assert!(bin.try_place(Rect::new(500, 500), "c"));
        assert_eq!((bin.placements[1].x, bin.placements[1].y), (600, 0));
        assert_eq!((bin.placements[2].x, bin.placements[2].y), (0, 300));
        assert_inside_no_overlap(Rect::new(1000, 1000), &bin.placements);
    }

    #[test]
    fn test_no_backtracking_to_earlier_shelf() {
        let mut bin = ShelfBin::new(Rect::new(1000, 1000));
        assert!(bin.try_place(Rect::new(900, 400), "a"));
        assert!(bin.try_place(Rect::new(500, 400), "b"));
        // Would fit beside "a" on the first shelf, but the cursor moved on.
        assert!(bin.try_place(Rect::new(100, 100), "c"));
        assert_eq!(bin.placements[2].y, 400);
    }

    #[test]
    fn test_refuses_shelf_past_bottom() {
        let mut bin = ShelfBin::new(Rect::new(100, 100));
        assert!(bin.try_place(Rect::new(100, 100), "a"));
        assert!(!bin.try_place(Rect::new(10, 10), "b"));
    }

    #[test]
    fn test_pack_rotates_free_piece() {
        let pieces = PieceBuffer::new(vec![piece(200, 100, MeshDirection::Free)]);
        let bin = ShelfBin::pack(Rect::new(100, 200), &pieces, &SheetOptions::default());
        assert_eq!(bin.picked, vec![0]);
        assert_eq!((bin.placements[0].w, bin.placements[0].h), (100, 200));
    }

    #[test]
    fn test_pack_respects_mesh() {
        let pieces = PieceBuffer::new(vec![piece(200, 100, MeshDirection::A)]);
        let bin = ShelfBin::pack(Rect::new(100, 200), &pieces, &SheetOptions::default());
        assert!(bin.picked.is_empty());

        let ignore = SheetOptions {
            ignore_direction: true,
            ..Default::default()
        };
        let bin = ShelfBin::pack(Rect::new(100, 200), &pieces, &ignore);
        assert_eq!(bin.made(), 1);
    }

    #[test]
    fn test_pack_skips_pieces_for_next_sheet() {
        let pieces = PieceBuffer::new(vec![
            piece(600, 600, MeshDirection::Free),
            piece(600, 600, MeshDirection::Free),
            piece(300, 300, MeshDirection::Free),
        ]);
        let sheet = Rect::new(1000, 1000);
        let bin = ShelfBin::pack(sheet, &pieces, &SheetOptions::default());
        assert_eq!(bin.picked, vec![0, 2]);
        assert_eq!(bin.used_area(), 360_000 + 90_000);
        assert_inside_no_overlap(sheet, &bin.placements);
    }
}
