// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Server-side HTML for the dashboard

use crate::config::AppConfig;
use crate::metrics::escape_html;
use crate::pipeline::UploadOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

impl NoticeKind {
    fn class(self) -> &'static str {
        match self {
            NoticeKind::Success => "notice success",
            NoticeKind::Info => "notice info",
            NoticeKind::Error => "notice error",
        }
    }
}

/// Banner shown above the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn from_outcome(outcome: &UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Processed { name, .. } => Self {
                kind: NoticeKind::Success,
                text: format!("{} processed", name),
            },
            UploadOutcome::AlreadyLoaded { name } => Self {
                kind: NoticeKind::Info,
                text: format!("{} is already loaded", name),
            },
            UploadOutcome::Rejected { message, .. } => Self {
                kind: NoticeKind::Error,
                text: message.clone(),
            },
        }
    }
}

/// Everything the main page shows
#[derive(Debug, Clone)]
pub struct PageView {
    pub bsdfs: Vec<String>,
    pub active: String,
    pub table_html: String,
    pub has_scene: bool,
    pub notices: Vec<Notice>,
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 280px; padding: 1rem; background: #f4f5f7; }
main { flex: 1; padding: 1rem 2rem; }
#viewer { width: 100%; height: 520px; border: 1px solid #ddd; }
table.metrics { border-collapse: collapse; margin-top: 1rem; }
table.metrics th, table.metrics td { padding: 0.3rem 0.8rem; border-bottom: 1px solid #ddd; text-align: right; }
.notice { padding: 0.6rem 1rem; margin-bottom: 0.5rem; border-radius: 4px; }
.notice.success { background: #e3f6e5; }
.notice.info { background: #e5eefb; }
.notice.error { background: #fbe5e5; }
"#;

const VIEWER_SCRIPT: &str = r#"
<script type="importmap">
{ "imports": {
    "three": "https://unpkg.com/three@0.160.0/build/three.module.js",
    "three/addons/": "https://unpkg.com/three@0.160.0/examples/jsm/"
} }
</script>
<script type="module">
import * as THREE from 'three';
import { OrbitControls } from 'three/addons/controls/OrbitControls.js';
import { GLTFLoader } from 'three/addons/loaders/GLTFLoader.js';

const container = document.getElementById('viewer');
const renderer = new THREE.WebGLRenderer({ antialias: true });
renderer.setPixelRatio(window.devicePixelRatio);
renderer.setSize(container.clientWidth, container.clientHeight);
container.appendChild(renderer.domElement);

const scene = new THREE.Scene();
scene.background = new THREE.Color(0xffffff);
scene.add(new THREE.AmbientLight(0xffffff, 1.0));
const camera = new THREE.PerspectiveCamera(45, container.clientWidth / container.clientHeight, 0.1, 1000);
const controls = new OrbitControls(camera, renderer.domElement);

new GLTFLoader().load(container.dataset.src, (gltf) => {
    scene.add(gltf.scene);
    const box = new THREE.Box3().setFromObject(gltf.scene);
    const center = box.getCenter(new THREE.Vector3());
    const size = box.getSize(new THREE.Vector3()).length();
    camera.position.copy(center).add(new THREE.Vector3(size * 0.6, size * 0.5, size * 0.6));
    controls.target.copy(center);
    controls.update();
});

window.addEventListener('resize', () => {
    camera.aspect = container.clientWidth / container.clientHeight;
    camera.updateProjectionMatrix();
    renderer.setSize(container.clientWidth, container.clientHeight);
});

(function animate() {
    requestAnimationFrame(animate);
    renderer.render(scene, camera);
})();
</script>
"#;

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

/// Main dashboard page
pub fn render_index(view: &PageView) -> String {
    let mut aside = String::from("<aside>\n<h2>BSDFs</h2>\n");
    aside.push_str(
        "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"bsdf\" accept=\".xml\" multiple>\n\
         <button type=\"submit\">Upload</button>\n</form>\n",
    );
    aside.push_str("<form action=\"/select\" method=\"post\">\n");
    for name in &view.bsdfs {
        let checked = if *name == view.active { " checked" } else { "" };
        aside.push_str(&format!(
            "<label><input type=\"radio\" name=\"bsdf\" value=\"{0}\" onchange=\"this.form.submit()\"{1}> {0}</label><br>\n",
            escape_html(name),
            checked
        ));
    }
    aside.push_str("</form>\n<p><a href=\"/info\">Simulation parameters</a></p>\n</aside>\n");

    let mut main = String::from("<main>\n<h1>BSDF daylight dashboard</h1>\n");
    for notice in &view.notices {
        main.push_str(&format!(
            "<div class=\"{}\">{}</div>\n",
            notice.kind.class(),
            escape_html(&notice.text)
        ));
    }
    main.push_str(&format!("<h2>{}</h2>\n", escape_html(&view.active)));
    if view.has_scene {
        main.push_str(&format!(
            "<div id=\"viewer\" data-src=\"/viz/{}.glb\"></div>\n",
            escape_html(&view.active)
        ));
        main.push_str(VIEWER_SCRIPT);
    } else {
        main.push_str("<p>No visualization available for this BSDF.</p>\n");
    }
    main.push_str("<h2>Metrics</h2>\n");
    main.push_str(&view.table_html);
    main.push_str("\n</main>");

    document("BSDF daylight dashboard", &format!("{}{}", aside, main))
}

/// Informational page with the fixed simulation parameters
pub fn render_info(config: &AppConfig) -> String {
    let body = format!(
        "<main>\n<h1>Simulation parameters</h1>\n<dl>\n\
         <dt>Daylight matrix</dt><dd><code>{}</code></dd>\n\
         <dt>View matrix</dt><dd><code>{}</code></dd>\n\
         <dt>Daylight autonomy threshold</dt><dd>{} lux</dd>\n\
         <dt>Useful daylight illuminance</dt><dd>{} - {} lux</dd>\n\
         </dl>\n<p><a href=\"/\">Back</a></p>\n</main>",
        escape_html(&config.simulation.daylight_matrix),
        escape_html(&config.simulation.view_matrix),
        config.post_process.threshold,
        config.post_process.min_t,
        config.post_process.max_t,
    );
    document("Simulation parameters", &body)
}

pub(crate) fn render_error(message: &str) -> String {
    let body = format!(
        "<main>\n<div class=\"notice error\">{}</div>\n<p><a href=\"/\">Back</a></p>\n</main>",
        escape_html(message)
    );
    document("Error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PageView {
        PageView {
            bsdfs: vec!["clear".to_string(), "venetian".to_string()],
            active: "venetian".to_string(),
            table_html: "<table class=\"metrics\"></table>".to_string(),
            has_scene: true,
            notices: vec![Notice {
                kind: NoticeKind::Error,
                text: "angle basis <Klems Half>".to_string(),
            }],
        }
    }

    #[test]
    fn test_index_marks_active_bsdf() {
        let html = render_index(&view());
        assert!(html.contains("value=\"venetian\" onchange=\"this.form.submit()\" checked"));
        assert!(!html.contains("value=\"clear\" onchange=\"this.form.submit()\" checked"));
        assert!(html.contains("data-src=\"/viz/venetian.glb\""));
        assert!(html.contains("<table class=\"metrics\">"));
    }

    #[test]
    fn test_notices_are_escaped() {
        let html = render_index(&view());
        assert!(html.contains("<div class=\"notice error\">angle basis &lt;Klems Half&gt;</div>"));
    }

    #[test]
    fn test_index_without_scene() {
        let mut view = view();
        view.has_scene = false;
        let html = render_index(&view);
        assert!(!html.contains("id=\"viewer\""));
        assert!(!html.contains("importmap"));
    }

    #[test]
    fn test_info_lists_parameters() {
        let html = render_info(&AppConfig::default());
        assert!(html.contains("-ab 3 -ad 2048 -lw 4.88e-06 -c 1000"));
        assert!(html.contains("-ab 6 -ad 16384 -lw 6.10e-07"));
        assert!(html.contains("300 lux"));
    }

    #[test]
    fn test_notice_from_outcome() {
        let notice = Notice::from_outcome(&UploadOutcome::AlreadyLoaded {
            name: "clear".to_string(),
        });
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.text, "clear is already loaded");
    }
}
