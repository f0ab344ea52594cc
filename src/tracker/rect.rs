/// Bounding box representation with format conversion utilities.
///
/// Stored as TLWH (top-left x, top-left y, width, height). Conversions:
/// - XYWH: Center X, Center Y, Width, Height
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from XYWH format (center x, center y, width, height).
    #[inline]
    pub fn from_xywh(xywh: [f32; 4]) -> Self {
        let [cx, cy, width, height] = xywh;
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Convert to XYWH format: (center_x, center_y, width, height).
    #[inline]
    pub fn to_xywh(&self) -> [f32; 4] {
        let (cx, cy) = self.center();
        [cx, cy, self.width, self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Manhattan distance between the top-left corners of two boxes.
    #[inline]
    pub fn corner_distance(&self, other: &Rect) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    ///
    /// Boxes that only touch, or that have zero area, have an IoU of 0.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }
        let inter_area = (x2 - x1) * (y2 - y1);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_conversions() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);

        assert_eq!(rect.to_tlwh(), [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
        assert_eq!(rect.to_xywh(), [25.0, 40.0, 30.0, 40.0]);
    }

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect.to_tlwh(), [10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_from_xywh() {
        let rect = Rect::from_xywh([20.0, 20.0, 20.0, 10.0]);
        assert_eq!(rect.to_tlwh(), [10.0, 15.0, 20.0, 10.0]);
    }

    #[test]
    fn test_corner_distance() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(3.0, -4.0, 10.0, 10.0);
        assert_eq!(a.corner_distance(&b), 7.0);
        assert_eq!(b.corner_distance(&a), 7.0);
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // Intersection: 5x5 = 25
        // Union: 100 + 100 - 25 = 175
        let iou = a.iou(&b);
        assert!((iou - 25.0 / 175.0).abs() < 1e-6);
        assert_eq!(iou, b.iou(&a));
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);

        let touching = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(a.iou(&touching), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let flat = Rect::new(2.0, 2.0, 5.0, 0.0);
        assert_eq!(a.iou(&flat), 0.0);
        assert_eq!(flat.iou(&flat), 0.0);
    }
}
