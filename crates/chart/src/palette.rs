use image::Rgb;

/// Slice colours, assigned by position in label order and reused cyclically.
pub const PALETTE: [[u8; 3]; 10] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

pub fn color_for(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

pub fn rgb(color: [u8; 3]) -> Rgb<u8> {
    Rgb(color)
}
