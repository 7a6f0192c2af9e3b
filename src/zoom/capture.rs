use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::time::{Duration, Instant};

/// Time given to the desktop to repaint after the cursor overlay hides.
pub const CAPTURE_DELAY: Duration = Duration::from_millis(50);

pub trait ScreenGrabber {
    fn grab(&mut self) -> Result<RgbaImage>;
}

/// Captures the primary monitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopGrabber;

impl ScreenGrabber for DesktopGrabber {
    fn grab(&mut self) -> Result<RgbaImage> {
        capture_primary_monitor()
    }
}

#[cfg(windows)]
fn capture_primary_monitor() -> Result<RgbaImage> {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
        GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
        HGDIOBJ, SRCCOPY,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    if width <= 0 || height <= 0 {
        return Err(anyhow!("primary monitor reports empty bounds"));
    }

    unsafe {
        let screen_dc = GetDC(HWND::default());
        if screen_dc.0.is_null() {
            return Err(anyhow!("GetDC failed for screen capture"));
        }
        let mem_dc = CreateCompatibleDC(screen_dc);
        if mem_dc.0.is_null() {
            let _ = ReleaseDC(HWND::default(), screen_dc);
            return Err(anyhow!("CreateCompatibleDC failed for screen capture"));
        }
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if bitmap.0.is_null() {
            let _ = DeleteDC(mem_dc);
            let _ = ReleaseDC(HWND::default(), screen_dc);
            return Err(anyhow!("CreateCompatibleBitmap failed for screen capture"));
        }

        let previous = SelectObject(mem_dc, HGDIOBJ(bitmap.0));
        let copied = BitBlt(mem_dc, 0, 0, width, height, screen_dc, 0, 0, SRCCOPY).is_ok();

        let mut info = BITMAPINFO::default();
        info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        };
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        let rows = if copied {
            GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(pixels.as_mut_ptr() as *mut _),
                &mut info,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        let _ = SelectObject(mem_dc, previous);
        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(mem_dc);
        let _ = ReleaseDC(HWND::default(), screen_dc);

        if !copied {
            return Err(anyhow!("BitBlt failed for screen capture"));
        }
        if rows == 0 {
            return Err(anyhow!("GetDIBits failed for screen capture"));
        }

        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }
        RgbaImage::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| anyhow!("captured buffer does not match monitor size"))
    }
}

#[cfg(all(not(windows), feature = "portable_capture"))]
fn capture_primary_monitor() -> Result<RgbaImage> {
    let screen = screenshots::Screen::from_point(0, 0)?;
    let shot = screen.capture()?;
    Ok(shot)
}

#[cfg(all(not(windows), not(feature = "portable_capture")))]
fn capture_primary_monitor() -> Result<RgbaImage> {
    Err(anyhow!(
        "screen capture needs Windows or the portable_capture feature"
    ))
}

/// Rejects captures that produced no pixels.
pub fn validate_capture(image: RgbaImage) -> Result<RgbaImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(anyhow!("screen capture returned an empty image"));
    }
    Ok(image)
}

/// Deferred capture request. Each request carries a token; cancelling or
/// rescheduling invalidates older tokens so a stale request never fires.
#[derive(Debug, Default)]
pub struct CaptureSchedule {
    next_token: u64,
    pending: Option<(Instant, u64)>,
}

impl CaptureSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant) -> u64 {
        self.next_token += 1;
        self.pending = Some((now + CAPTURE_DELAY, self.next_token));
        self.next_token
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.map(|(due, _)| due)
    }

    /// Returns the live token once its delay has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<u64> {
        let (due, token) = self.pending?;
        if now < due {
            return None;
        }
        self.pending = None;
        Some(token)
    }
}
