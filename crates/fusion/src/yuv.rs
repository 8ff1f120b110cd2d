//! Color camera image → RGBA8

use contracts::{ColorImage, ImageFormat};

/// Convert NV21 (Y plane, then interleaved V/U at 2x2 subsampling) to RGBA8
///
/// BT.601 video range; luma is floored at 16, every channel clamped to [0, 255],
/// alpha is opaque. `stride` is the row pitch of both planes.
pub fn nv21_to_rgba(src: &[u8], width: usize, height: usize, stride: usize, dst: &mut [u8]) {
    let stride = stride.max(width);
    let chroma_base = stride * height;

    for row in 0..height {
        let luma_row = row * stride;
        let chroma_row = chroma_base + (row >> 1) * stride;
        let out_row = &mut dst[row * width * 4..(row + 1) * width * 4];

        for (col, px) in out_row.chunks_exact_mut(4).enumerate() {
            let y = i32::from(src[luma_row + col]).max(16);
            let c = chroma_row + (col & !1);
            let v = i32::from(src[c]) - 128;
            let u = i32::from(src[c + 1]) - 128;

            let yf = 1.164f32 * (y - 16) as f32;
            let r = (yf + 1.596 * v as f32) as i32;
            let g = (yf - 0.813 * v as f32 - 0.391 * u as f32) as i32;
            let b = (yf + 2.018 * u as f32) as i32;

            px[0] = r.clamp(0, 255) as u8;
            px[1] = g.clamp(0, 255) as u8;
            px[2] = b.clamp(0, 255) as u8;
            px[3] = 255;
        }
    }
}

/// Convert any supported color frame into `dst` (resized to `4 * w * h`)
pub fn color_to_rgba(image: &ColorImage, dst: &mut Vec<u8>) {
    let (w, h) = (image.width as usize, image.height as usize);
    dst.resize(w * h * 4, 0);
    match image.format {
        ImageFormat::YCrCb420Sp => nv21_to_rgba(&image.data, w, h, image.stride as usize, dst),
        ImageFormat::Rgba8 => copy_rgba_rows(&image.data, w, h, image.stride as usize, dst),
    }
}

fn copy_rgba_rows(src: &[u8], width: usize, height: usize, stride: usize, dst: &mut [u8]) {
    let row_len = width * 4;
    let pitch = stride.max(row_len);
    if pitch == row_len {
        dst.copy_from_slice(&src[..row_len * height]);
        return;
    }
    for (row, out) in dst.chunks_exact_mut(row_len).enumerate() {
        let start = row * pitch;
        out.copy_from_slice(&src[start..start + row_len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_nv21(w: usize, h: usize, y: u8, v: u8, u: u8) -> Vec<u8> {
        let mut data = vec![y; w * h];
        for _ in 0..(w * h.div_ceil(2) / 2) {
            data.push(v);
            data.push(u);
        }
        data
    }

    #[test]
    fn test_gray_levels() {
        let mut dst = vec![0; 4 * 4 * 4];
        nv21_to_rgba(&make_nv21(4, 4, 16, 128, 128), 4, 4, 4, &mut dst);
        assert!(dst.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));

        nv21_to_rgba(&make_nv21(4, 4, 235, 128, 128), 4, 4, 4, &mut dst);
        // 1.164 * 219 = 254.9 truncates to 254
        assert!(dst.chunks_exact(4).all(|p| p == [254, 254, 254, 255]));

        // Luma below 16 is floored
        nv21_to_rgba(&make_nv21(4, 4, 0, 128, 128), 4, 4, 4, &mut dst);
        assert!(dst.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn test_channels_clamp() {
        let mut dst = vec![0; 4 * 2 * 2];
        // Strong red chroma saturates R
        nv21_to_rgba(&make_nv21(2, 2, 200, 255, 128), 2, 2, 2, &mut dst);
        assert_eq!(dst[0], 255);
        assert_eq!(dst[1], 110);
        assert_eq!(dst[2], 214);

        // Black luma with extreme chroma: R below 0, B above 255
        nv21_to_rgba(&make_nv21(2, 2, 16, 0, 255), 2, 2, 2, &mut dst);
        assert_eq!(&dst[..4], &[0, 54, 255, 255]);
    }

    #[test]
    fn test_chroma_shared_per_2x2_block() {
        // 4x2: left block neutral, right block blue-ish
        let mut src = vec![128u8; 8];
        src.extend_from_slice(&[128, 128, 128, 228]);
        let mut dst = vec![0; 4 * 8];
        nv21_to_rgba(&src, 4, 2, 4, &mut dst);

        let px = |i: usize| &dst[i * 4..i * 4 + 4];
        assert_eq!(px(0), px(1));
        assert_eq!(px(0), px(4));
        assert_eq!(px(2), px(7));
        assert!(px(2)[2] > px(0)[2]);
    }

    #[test]
    fn test_stride_padding_ignored() {
        // width 2, stride 4: padding bytes are 0 and must not leak in
        let src = vec![
            100, 100, 0, 0, // row 0
            100, 100, 0, 0, // row 1
            128, 128, 0, 0, // chroma
        ];
        let mut dst = vec![0; 16];
        nv21_to_rgba(&src, 2, 2, 4, &mut dst);
        assert!(dst.chunks_exact(4).all(|p| p == [97, 97, 97, 255]));
    }

    #[test]
    fn test_rgba_passthrough() {
        let img = ColorImage {
            width: 1,
            height: 2,
            format: ImageFormat::Rgba8,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
            ..Default::default()
        };
        let mut dst = Vec::new();
        color_to_rgba(&img, &mut dst);
        assert_eq!(dst, img.data);
    }

    #[test]
    fn test_rgba_row_padding_skipped() {
        // 1x2 with 8-byte pitch: bytes 4..8 of each row are padding
        let img = ColorImage {
            width: 1,
            height: 2,
            stride: 8,
            format: ImageFormat::Rgba8,
            data: vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0],
            ..Default::default()
        };
        let mut dst = Vec::new();
        color_to_rgba(&img, &mut dst);
        assert_eq!(dst, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
