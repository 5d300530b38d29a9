//! The single-page UI: layout, styling, and the upload/live sections.
//!
//! Everything is rendered server-side into one HTML document; the only
//! script is the upload fetch + metrics rendering.

use facemark_core::shared::constants::TOTAL_LANDMARKS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageMode {
    Upload,
    Live,
}

impl PageMode {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("live") => PageMode::Live,
            _ => PageMode::Upload,
        }
    }
}

const STYLE: &str = r#"
    body {
        margin: 0;
        font-family: -apple-system, 'Segoe UI', Roboto, sans-serif;
        background: linear-gradient(180deg, #0e0e12 0%, #1b1b22 100%);
        color: #ffffff;
        min-height: 100vh;
    }
    .wrap { max-width: 980px; margin: 0 auto; padding: 24px; }
    h1 {
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        -webkit-background-clip: text;
        -webkit-text-fill-color: transparent;
        background-clip: text;
        font-size: 2.4rem;
        text-align: center;
        margin-bottom: 0.5rem;
    }
    .subtitle { text-align: center; color: #bcbcbc; margin-bottom: 2rem; line-height: 1.6; }
    .modes { display: flex; justify-content: center; gap: 12px; margin-bottom: 24px; }
    .modes a {
        color: #fff; text-decoration: none; padding: 10px 22px; border-radius: 25px;
        background: #2a2a35; border: 1px solid #444; transition: all 0.3s ease;
    }
    .modes a.active { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); border: none; }
    .card {
        background: linear-gradient(135deg, #2a2a35 0%, #3a3a45 100%);
        border: 1px solid #444; border-radius: 15px; padding: 20px; margin-bottom: 20px;
    }
    .uploader { border: 2px dashed #667eea; border-radius: 10px; padding: 20px; text-align: center; }
    button {
        background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        color: white; border: none; border-radius: 25px; padding: 12px 24px;
        font-weight: 600; cursor: pointer;
    }
    .columns { display: flex; gap: 20px; flex-wrap: wrap; }
    .columns figure { flex: 1; min-width: 280px; margin: 0; text-align: center; }
    .columns img { max-width: 100%; border-radius: 10px; }
    figcaption { color: #bcbcbc; font-size: 0.9rem; margin-top: 6px; }
    .metrics { display: flex; gap: 16px; flex-wrap: wrap; }
    .metric { flex: 1; min-width: 160px; text-align: center; }
    .metric .value { font-size: 1.8rem; font-weight: bold; }
    .metric .label { color: #bcbcbc; font-size: 0.9rem; }
    .banner { border-radius: 10px; padding: 14px 18px; margin: 16px 0; }
    .banner.success { background: #14321e; border: 1px solid #2a7a44; }
    .banner.error { background: #3a1a1e; border: 1px solid #8a3a44; }
    .banner.info { background: #1a2a3a; border: 1px solid #3a5a8a; }
    .hidden { display: none; }
    ul { line-height: 1.8; }
    footer { text-align: center; color: #bcbcbc; font-size: 0.9rem; padding: 25px; }
"#;

const SCRIPT: &str = r#"
    const input = document.getElementById('file-input');
    const button = document.getElementById('detect-button');
    const results = document.getElementById('results');
    const banner = document.getElementById('banner');
    const originalImg = document.getElementById('original');
    const annotatedImg = document.getElementById('annotated');

    function showBanner(kind, text) {
        banner.className = 'banner ' + kind;
        banner.textContent = text;
        banner.classList.remove('hidden');
    }

    button.addEventListener('click', async () => {
        const file = input.files[0];
        if (!file) {
            showBanner('info', 'Choose a JPG or PNG image first.');
            return;
        }
        showBanner('info', 'Analyzing image...');
        results.classList.add('hidden');
        try {
            const response = await fetch('/api/detect', {
                method: 'POST',
                headers: { 'Content-Type': file.type },
                body: file,
            });
            const data = await response.json();
            if (!response.ok) {
                showBanner('error', data.message || 'Something went wrong.');
                return;
            }
            originalImg.src = URL.createObjectURL(file);
            if (data.success) {
                showBanner('success', 'Detection successful! Facial landmarks found.');
                annotatedImg.src = data.annotated;
                document.getElementById('metric-faces').textContent = data.face_count;
                document.getElementById('metric-landmarks').textContent =
                    data.landmark_count + '/' + data.total_landmarks;
                const pct = data.coverage_percent;
                const dot = pct > 90 ? '\u{1F7E2}' : pct > 70 ? '\u{1F7E1}' : '\u{1F534}';
                document.getElementById('metric-coverage').textContent =
                    dot + ' ' + pct.toFixed(1) + '%';
                results.classList.remove('hidden');
            } else {
                showBanner('error', data.message);
            }
        } catch (err) {
            showBanner('error', 'Upload failed: ' + err);
        }
    });
"#;

/// Render the full page for the selected mode.
pub fn render(mode: PageMode, live_available: bool) -> String {
    let upload_active = if mode == PageMode::Upload { "active" } else { "" };
    let live_active = if mode == PageMode::Live { "active" } else { "" };
    let section = match mode {
        PageMode::Upload => upload_section(),
        PageMode::Live => live_section(live_available),
    };
    let info = info_section(mode);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Facemark &mdash; Face Landmark Detector</title>
<style>{STYLE}</style>
</head>
<body>
<div class="wrap">
<h1>Face Landmark Detector</h1>
<p class="subtitle">Detects <strong>{TOTAL_LANDMARKS} key points</strong> on human faces.<br>
Upload a photo with a face, or switch to the live camera.</p>
<nav class="modes">
<a href="/" class="{upload_active}">Upload image</a>
<a href="/?mode=live" class="{live_active}">Live camera</a>
</nav>
{section}
{info}
<footer>Facemark &mdash; face landmark detection demo</footer>
</div>
</body>
</html>
"#
    )
}

fn upload_section() -> String {
    format!(
        r#"<section class="card">
<div class="uploader">
<p>Upload an image with a face (JPG, JPEG or PNG)</p>
<input type="file" id="file-input" accept=".jpg,.jpeg,.png">
<button id="detect-button">Detect landmarks</button>
</div>
<div id="banner" class="banner info hidden"></div>
<div id="results" class="hidden">
<div class="columns">
<figure><img id="original" alt="Original image"><figcaption>Original image</figcaption></figure>
<figure><img id="annotated" alt="Annotated image"><figcaption>Detected landmarks</figcaption></figure>
</div>
<div class="metrics">
<div class="card metric"><div class="value" id="metric-faces"></div><div class="label">Faces detected</div></div>
<div class="card metric"><div class="value" id="metric-landmarks"></div><div class="label">Landmarks</div></div>
<div class="card metric"><div class="value" id="metric-coverage"></div><div class="label">Coverage</div></div>
</div>
</div>
</section>
<script>{SCRIPT}</script>"#
    )
}

fn live_section(live_available: bool) -> String {
    if live_available {
        r#"<section class="card">
<p>Live detection runs frame by frame on the camera feed.</p>
<div class="columns">
<figure><img src="/api/stream" alt="Live camera with landmarks"><figcaption>Live landmarks</figcaption></figure>
</div>
<p class="banner info">Leave this page to release the camera.</p>
</section>"#
            .to_string()
    } else {
        r#"<section class="card" id="live-placeholder">
<div class="banner info">Live camera mode is not available in this deployment.</div>
<p>Live detection needs direct access to camera hardware, which this
server does not have. To use it:</p>
<ul>
<li>Run the server locally on a machine with a camera</li>
<li>Build with the <code>live-camera</code> feature enabled</li>
<li>Point <code>FACEMARK_CAMERA</code> at your device (default <code>/dev/video0</code>)</li>
</ul>
</section>"#
            .to_string()
    }
}

fn info_section(mode: PageMode) -> String {
    let camera_tips = if mode == PageMode::Live {
        r#"<section class="card">
<h3>Camera tips</h3>
<ul>
<li><strong>Lighting:</strong> prefer natural, even light</li>
<li><strong>Position:</strong> keep the face centered, looking at the camera</li>
<li><strong>Distance:</strong> 30&ndash;50 cm from the lens works best</li>
<li><strong>Movement:</strong> avoid fast shakes</li>
</ul>
</section>"#
    } else {
        ""
    };

    format!(
        r#"<section class="card">
<h3>What are facial landmarks?</h3>
<p>They are <strong>{TOTAL_LANDMARKS} reference points</strong> mapping the
eyes (iris, eyelids, brows), the nose (bridge, nostrils, base), the mouth
(lips, corners) and the facial contour (jaw, cheekbones).</p>
</section>
<section class="card">
<h3>Applications</h3>
<ul>
<li><strong>AR filters:</strong> real-time face effects</li>
<li><strong>Expression analysis:</strong> reading facial gestures</li>
<li><strong>Animation:</strong> film and game character rigs</li>
<li><strong>Biometrics:</strong> face-based authentication</li>
<li><strong>Medicine:</strong> anatomical analysis</li>
</ul>
</section>
{camera_tips}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_query() {
        assert_eq!(PageMode::from_query(Some("live")), PageMode::Live);
        assert_eq!(PageMode::from_query(Some("upload")), PageMode::Upload);
        assert_eq!(PageMode::from_query(Some("garbage")), PageMode::Upload);
        assert_eq!(PageMode::from_query(None), PageMode::Upload);
    }

    #[test]
    fn test_upload_page_has_uploader_and_accept_gate() {
        let html = render(PageMode::Upload, false);
        assert!(html.contains(r#"accept=".jpg,.jpeg,.png""#));
        assert!(html.contains("/api/detect"));
        assert!(html.contains("478"));
    }

    #[test]
    fn test_live_page_without_camera_shows_placeholder() {
        let html = render(PageMode::Live, false);
        assert!(html.contains("live-placeholder"));
        assert!(html.contains("not available"));
        assert!(!html.contains("/api/stream"));
    }

    #[test]
    fn test_live_page_with_camera_embeds_stream() {
        let html = render(PageMode::Live, true);
        assert!(html.contains(r#"src="/api/stream""#));
        assert!(!html.contains("live-placeholder"));
        assert!(html.contains("Camera tips"));
    }

    #[test]
    fn test_mode_selector_marks_active_mode() {
        let upload = render(PageMode::Upload, false);
        assert!(upload.contains(r#"<a href="/" class="active">"#));
        let live = render(PageMode::Live, false);
        assert!(live.contains(r#"<a href="/?mode=live" class="active">"#));
    }

    #[test]
    fn test_info_sections_always_present() {
        for (mode, available) in [
            (PageMode::Upload, false),
            (PageMode::Live, false),
            (PageMode::Live, true),
        ] {
            let html = render(mode, available);
            assert!(html.contains("What are facial landmarks?"));
            assert!(html.contains("Applications"));
        }
    }
}
