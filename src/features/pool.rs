use crate::images::tensor::ImageTensor;

/// Area-average pooling of an RGB tensor onto a `grid_w × grid_h` grid.
///
/// Cell `(gx, gy)` covers columns `[gx*W/grid_w, (gx+1)*W/grid_w)` and the
/// matching rows, so every pixel lands in exactly one cell. Both grid sides
/// must be no larger than the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPool {
    pub grid_w: u32,
    pub grid_h: u32,
}

impl GridPool {
    pub fn new(grid_w: u32, grid_h: u32) -> GridPool {
        GridPool { grid_w, grid_h }
    }

    pub fn output_len(&self) -> usize {
        self.grid_w as usize * self.grid_h as usize * 3
    }

    pub fn fits(&self, image: &ImageTensor) -> bool {
        self.grid_w > 0 && self.grid_h > 0 && self.grid_w <= image.width && self.grid_h <= image.height
    }

    fn span(cell: u32, cells: u32, len: u32) -> (u32, u32) {
        let start = (cell as u64 * len as u64 / cells as u64) as u32;
        let end = ((cell as u64 + 1) * len as u64 / cells as u64) as u32;
        (start, end)
    }

    pub fn forward(&self, image: &ImageTensor) -> Vec<f64> {
        let mut out = vec![0.0; self.output_len()];
        for gy in 0..self.grid_h {
            let (y0, y1) = Self::span(gy, self.grid_h, image.height);
            for gx in 0..self.grid_w {
                let (x0, x1) = Self::span(gx, self.grid_w, image.width);
                let count = (y1 - y0) as f64 * (x1 - x0) as f64;
                let cell = (gy as usize * self.grid_w as usize + gx as usize) * 3;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let px = (y as usize * image.width as usize + x as usize) * 3;
                        for c in 0..3 {
                            out[cell + c] += image.data[px + c];
                        }
                    }
                }
                for c in 0..3 {
                    out[cell + c] /= count;
                }
            }
        }
        out
    }

    /// Spreads a gradient on the pooled grid back over the pixels of a
    /// `width × height` image.
    pub fn backward(&self, grad: &[f64], width: u32, height: u32) -> Vec<f64> {
        let mut out = vec![0.0; width as usize * height as usize * 3];
        for gy in 0..self.grid_h {
            let (y0, y1) = Self::span(gy, self.grid_h, height);
            for gx in 0..self.grid_w {
                let (x0, x1) = Self::span(gx, self.grid_w, width);
                let count = (y1 - y0) as f64 * (x1 - x0) as f64;
                let cell = (gy as usize * self.grid_w as usize + gx as usize) * 3;
                for y in y0..y1 {
                    for x in x0..x1 {
                        let px = (y as usize * width as usize + x as usize) * 3;
                        for c in 0..3 {
                            out[px + c] = grad[cell + c] / count;
                        }
                    }
                }
            }
        }
        out
    }
}
