//! RGB <-> HSL and RGB <-> YUV conversions.
//!
//! Pure elementwise maps with no inter-pixel dependency, so the plane-level
//! functions fan out over the compute pool using whatever chunking the
//! schedule dictates. The per-pixel helpers are kept separate and exact so
//! the numeric behavior can be pinned down in tests.

use crate::planes::{HslPlanes, RgbPlanes, YuvPlanes};
use crate::schedule::Schedule;
use rayon::prelude::*;

const ONE_THIRD: f32 = 1.0 / 3.0;
const TWO_THIRDS: f32 = 2.0 / 3.0;

/// RGB in [0, 255] to H, S in [0.0, 1.0] and L quantized to [0, 255].
#[inline]
pub fn hsl_of_rgb(r: u8, g: u8, b: u8) -> (f32, f32, u8) {
    let var_r = r as f32 / 255.0;
    let var_g = g as f32 / 255.0;
    let var_b = b as f32 / 255.0;

    let var_min = var_r.min(var_g).min(var_b);
    let var_max = var_r.max(var_g).max(var_b);
    let del_max = var_max - var_min;

    let l = (var_max + var_min) / 2.0;

    let mut h;
    let s;
    if del_max == 0.0 {
        // Achromatic pixel: hue and saturation carry no information
        h = 0.0;
        s = 0.0;
    } else {
        s = if l < 0.5 {
            del_max / (var_max + var_min)
        } else {
            del_max / (2.0 - var_max - var_min)
        };

        let del_r = (((var_max - var_r) / 6.0) + (del_max / 2.0)) / del_max;
        let del_g = (((var_max - var_g) / 6.0) + (del_max / 2.0)) / del_max;
        let del_b = (((var_max - var_b) / 6.0) + (del_max / 2.0)) / del_max;

        // Six-sector hue, anchored on whichever channel is the max
        h = if var_r == var_max {
            del_b - del_g
        } else if var_g == var_max {
            ONE_THIRD + del_r - del_b
        } else {
            TWO_THIRDS + del_g - del_r
        };
    }

    if h < 0.0 {
        h += 1.0;
    }
    if h > 1.0 {
        h -= 1.0;
    }

    (h, s, (l * 255.0) as u8)
}

/// Fold a hue into its piecewise-linear segment between the two reference
/// points.
#[inline]
fn hue_to_rgb(v1: f32, v2: f32, vh: f32) -> f32 {
    let mut vh = vh;
    if vh < 0.0 {
        vh += 1.0;
    }
    if vh > 1.0 {
        vh -= 1.0;
    }
    if 6.0 * vh < 1.0 {
        return v1 + (v2 - v1) * 6.0 * vh;
    }
    if 2.0 * vh < 1.0 {
        return v2;
    }
    if 3.0 * vh < 2.0 {
        return v1 + (v2 - v1) * (TWO_THIRDS - vh) * 6.0;
    }
    v1
}

/// H, S in [0.0, 1.0] and L in [0, 255] back to RGB in [0, 255].
#[inline]
pub fn rgb_of_hsl(h: f32, s: f32, l: u8) -> (u8, u8, u8) {
    let l = l as f32 / 255.0;

    if s == 0.0 {
        let v = (l * 255.0) as u8;
        return (v, v, v);
    }

    let var_2 = if l < 0.5 { l * (1.0 + s) } else { (l + s) - (s * l) };
    let var_1 = 2.0 * l - var_2;

    let r = (255.0 * hue_to_rgb(var_1, var_2, h + ONE_THIRD)) as u8;
    let g = (255.0 * hue_to_rgb(var_1, var_2, h)) as u8;
    let b = (255.0 * hue_to_rgb(var_1, var_2, h - ONE_THIRD)) as u8;
    (r, g, b)
}

/// BT.601-style RGB to YUV, all components in [0, 255].
#[inline]
pub fn yuv_of_rgb(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.169 * r - 0.331 * g + 0.499 * b + 128.0;
    let v = 0.499 * r - 0.418 * g - 0.0813 * b + 128.0;
    (y as u8, u as u8, v as u8)
}

#[inline]
fn clip_rgb(x: i32) -> u8 {
    x.clamp(0, 255) as u8
}

/// Inverse of [`yuv_of_rgb`], with each result clamped to [0, 255].
#[inline]
pub fn rgb_of_yuv(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let cb = (u as i32 - 128) as f32;
    let cr = (v as i32 - 128) as f32;

    let rt = (y + 1.402 * cr) as i32;
    let gt = (y - 0.344 * cb - 0.714 * cr) as i32;
    let bt = (y + 1.772 * cb) as i32;
    (clip_rgb(rt), clip_rgb(gt), clip_rgb(bt))
}

/// Convert a planar RGB image to HSL, thread-parallel over disjoint chunks.
pub fn rgb_to_hsl(img: &RgbPlanes, schedule: &Schedule) -> HslPlanes {
    let n = img.pixel_count();
    let chunk = schedule.chunk_len(n);
    let mut h = vec![0f32; n];
    let mut s = vec![0f32; n];
    let mut l = vec![0u8; n];

    schedule.install(|| {
        h.par_chunks_mut(chunk)
            .zip(s.par_chunks_mut(chunk))
            .zip(l.par_chunks_mut(chunk))
            .enumerate()
            .for_each(|(ci, ((hc, sc), lc))| {
                let base = ci * chunk;
                for j in 0..hc.len() {
                    let i = base + j;
                    let (ph, ps, pl) = hsl_of_rgb(img.r[i], img.g[i], img.b[i]);
                    hc[j] = ph;
                    sc[j] = ps;
                    lc[j] = pl;
                }
            });
    });

    HslPlanes {
        width: img.width,
        height: img.height,
        h,
        s,
        l,
    }
}

/// Convert HSL planes back to planar RGB.
pub fn hsl_to_rgb(img: &HslPlanes, schedule: &Schedule) -> RgbPlanes {
    let n = img.l.len();
    let chunk = schedule.chunk_len(n);
    let mut r = vec![0u8; n];
    let mut g = vec![0u8; n];
    let mut b = vec![0u8; n];

    schedule.install(|| {
        r.par_chunks_mut(chunk)
            .zip(g.par_chunks_mut(chunk))
            .zip(b.par_chunks_mut(chunk))
            .enumerate()
            .for_each(|(ci, ((rc, gc), bc))| {
                let base = ci * chunk;
                for j in 0..rc.len() {
                    let i = base + j;
                    let (pr, pg, pb) = rgb_of_hsl(img.h[i], img.s[i], img.l[i]);
                    rc[j] = pr;
                    gc[j] = pg;
                    bc[j] = pb;
                }
            });
    });

    RgbPlanes {
        width: img.width,
        height: img.height,
        r,
        g,
        b,
    }
}

/// Convert a planar RGB image to YUV.
pub fn rgb_to_yuv(img: &RgbPlanes, schedule: &Schedule) -> YuvPlanes {
    let n = img.pixel_count();
    let chunk = schedule.chunk_len(n);
    let mut y = vec![0u8; n];
    let mut u = vec![0u8; n];
    let mut v = vec![0u8; n];

    schedule.install(|| {
        y.par_chunks_mut(chunk)
            .zip(u.par_chunks_mut(chunk))
            .zip(v.par_chunks_mut(chunk))
            .enumerate()
            .for_each(|(ci, ((yc, uc), vc))| {
                let base = ci * chunk;
                for j in 0..yc.len() {
                    let i = base + j;
                    let (py, pu, pv) = yuv_of_rgb(img.r[i], img.g[i], img.b[i]);
                    yc[j] = py;
                    uc[j] = pu;
                    vc[j] = pv;
                }
            });
    });

    YuvPlanes {
        width: img.width,
        height: img.height,
        y,
        u,
        v,
    }
}

/// Convert YUV planes back to planar RGB.
pub fn yuv_to_rgb(img: &YuvPlanes, schedule: &Schedule) -> RgbPlanes {
    let n = img.y.len();
    let chunk = schedule.chunk_len(n);
    let mut r = vec![0u8; n];
    let mut g = vec![0u8; n];
    let mut b = vec![0u8; n];

    schedule.install(|| {
        r.par_chunks_mut(chunk)
            .zip(g.par_chunks_mut(chunk))
            .zip(b.par_chunks_mut(chunk))
            .enumerate()
            .for_each(|(ci, ((rc, gc), bc))| {
                let base = ci * chunk;
                for j in 0..rc.len() {
                    let i = base + j;
                    let (pr, pg, pb) = rgb_of_yuv(img.y[i], img.u[i], img.v[i]);
                    rc[j] = pr;
                    gc[j] = pg;
                    bc[j] = pb;
                }
            });
    });

    RgbPlanes {
        width: img.width,
        height: img.height,
        r,
        g,
        b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_have_the_expected_hue() {
        let (h, s, l) = hsl_of_rgb(255, 0, 0);
        assert_eq!((h, s, l), (0.0, 1.0, 127));

        let (h, s, _) = hsl_of_rgb(0, 255, 0);
        assert!((h - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(s, 1.0);

        let (h, s, _) = hsl_of_rgb(0, 0, 255);
        assert!((h - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn hue_stays_normalized() {
        for (r, g, b) in [(255, 0, 128), (128, 0, 255), (1, 254, 253), (200, 30, 90)] {
            let (h, _, _) = hsl_of_rgb(r, g, b);
            assert!((0.0..=1.0).contains(&h), "hue {} out of range", h);
        }
    }

    #[test]
    fn achromatic_pixels_have_no_hue_or_saturation() {
        for v in 0..=255u8 {
            let (h, s, l) = hsl_of_rgb(v, v, v);
            assert_eq!(h, 0.0);
            assert_eq!(s, 0.0);
            assert_eq!(l, v);
        }
    }

    #[test]
    fn achromatic_round_trip_is_exact() {
        for v in 0..=255u8 {
            let (h, s, l) = hsl_of_rgb(v, v, v);
            assert_eq!(rgb_of_hsl(h, s, l), (v, v, v));
        }
    }

    #[test]
    fn hsl_known_values() {
        let (h, s, l) = hsl_of_rgb(10, 20, 30);
        assert!((h - 0.583_333_3).abs() < 1e-6);
        assert!((s - 0.5).abs() < 1e-6);
        assert_eq!(l, 20);
        assert_eq!(rgb_of_hsl(h, s, l), (9, 20, 30));
    }

    #[test]
    fn hsl_round_trip_within_quantization_error() {
        // Lightness is quantized to a byte on the way out, so the round
        // trip can be off by up to two levels at full saturation
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(15) {
                for b in (0..=255u16).step_by(15) {
                    let (r, g, b) = (r as u8, g as u8, b as u8);
                    let (h, s, l) = hsl_of_rgb(r, g, b);
                    let (r2, g2, b2) = rgb_of_hsl(h, s, l);
                    for (orig, back) in [(r, r2), (g, g2), (b, b2)] {
                        let err = (orig as i16 - back as i16).abs();
                        assert!(
                            err <= 2,
                            "({},{},{}) -> ({},{},{}) off by {}",
                            r, g, b, r2, g2, b2, err
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn yuv_known_values() {
        assert_eq!(yuv_of_rgb(128, 128, 128), (128, 127, 127));
        assert_eq!(yuv_of_rgb(255, 0, 0), (76, 84, 255));
        assert_eq!(yuv_of_rgb(0, 0, 255), (29, 255, 107));
        assert_eq!(yuv_of_rgb(10, 20, 30), (18, 134, 122));
        assert_eq!(rgb_of_yuv(18, 134, 122), (9, 20, 28));
    }

    #[test]
    fn yuv_inverse_clamps_out_of_gamut_values() {
        // Large negative red term
        let (r, _, _) = rgb_of_yuv(0, 128, 0);
        assert_eq!(r, 0);
        // Large positive red term
        let (r, _, _) = rgb_of_yuv(255, 128, 255);
        assert_eq!(r, 255);
    }

    #[test]
    fn yuv_round_trip_within_chroma_quantization_error() {
        // Truncating y, u and v compounds through the inverse matrix; the
        // worst case over the full cube is four levels
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(15) {
                for b in (0..=255u16).step_by(15) {
                    let (r, g, b) = (r as u8, g as u8, b as u8);
                    let (y, u, v) = yuv_of_rgb(r, g, b);
                    let (r2, g2, b2) = rgb_of_yuv(y, u, v);
                    for (orig, back) in [(r, r2), (g, g2), (b, b2)] {
                        let err = (orig as i16 - back as i16).abs();
                        assert!(
                            err <= 4,
                            "({},{},{}) -> ({},{},{}) off by {}",
                            r, g, b, r2, g2, b2, err
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn plane_transforms_match_pixel_helpers() {
        let n = 64usize;
        let img = RgbPlanes::new(
            8,
            8,
            (0..n).map(|i| (i * 4) as u8).collect(),
            (0..n).map(|i| (255 - i * 3) as u8).collect(),
            (0..n).map(|i| (i * i % 251) as u8).collect(),
        )
        .unwrap();
        let schedule = Schedule::default();

        let hsl = rgb_to_hsl(&img, &schedule);
        let yuv = rgb_to_yuv(&img, &schedule);
        for i in 0..n {
            let (h, s, l) = hsl_of_rgb(img.r[i], img.g[i], img.b[i]);
            assert_eq!((hsl.h[i], hsl.s[i], hsl.l[i]), (h, s, l));
            let (y, u, v) = yuv_of_rgb(img.r[i], img.g[i], img.b[i]);
            assert_eq!((yuv.y[i], yuv.u[i], yuv.v[i]), (y, u, v));
        }
    }

    #[test]
    fn chunking_policy_does_not_change_results() {
        use crate::schedule::SchedulePolicy;

        let n = 1000usize;
        let img = RgbPlanes::new(
            100,
            10,
            (0..n).map(|i| (i % 256) as u8).collect(),
            (0..n).map(|i| (i * 7 % 256) as u8).collect(),
            (0..n).map(|i| (i * 13 % 256) as u8).collect(),
        )
        .unwrap();

        let reference = rgb_to_hsl(&img, &Schedule::default());
        for schedule in [
            Schedule::new(SchedulePolicy::Dynamic, Some(3)),
            Schedule::new(SchedulePolicy::Guided, None),
            Schedule::new(SchedulePolicy::Auto, Some(97)),
        ] {
            let other = rgb_to_hsl(&img, &schedule);
            assert_eq!(other.h, reference.h);
            assert_eq!(other.s, reference.s);
            assert_eq!(other.l, reference.l);
        }
    }
}
