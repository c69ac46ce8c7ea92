//! Override engine browser integration tests
//!
//! Run with: wasm-pack test --headless --chrome
//! (or --firefox)
//!
//! Every test installs the same profile into the test page, so the order the
//! runner picks does not matter. Tests that need a different profile install it
//! into a fresh same-origin iframe instead.

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Promise, Reflect};
use persona_wasm::overrides::{self, context::OverrideConfig, OverrideRegistry};
use persona_wasm::{NoiseInjector, Profile};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const PROFILE_JSON: &str = r#"{
    "userAgent": "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "platform": "Win32",
    "vendor": "Google Inc.",
    "languages": ["de-DE", "de", "en-US"],
    "hardwareConcurrency": 8,
    "deviceMemory": 8,
    "maxTouchPoints": 0,
    "screenWidth": 1920,
    "screenHeight": 1080,
    "colorDepth": 24,
    "pixelRatio": 1,
    "timezone": "America/Los_Angeles",
    "timezoneOffset": 480,
    "webglVendor": "Google Inc. (NVIDIA)",
    "webglRenderer": "ANGLE (NVIDIA, NVIDIA GeForce GTX 1660 Direct3D11 vs_5_0 ps_5_0, D3D11)",
    "plugins": ["PDF Viewer", "Chrome PDF Viewer", "Chromium PDF Viewer"],
    "latitude": 37.7749,
    "longitude": -122.4194
}"#;

fn install() -> JsValue {
    overrides::install_profile(JsValue::from_str(PROFILE_JSON), JsValue::UNDEFINED)
        .expect("install_profile should succeed")
}

fn eval(src: &str) -> JsValue {
    js_sys::eval(src).unwrap_or_else(|e| panic!("eval failed for {}: {:?}", src, e))
}

fn get(obj: &JsValue, name: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(name)).unwrap()
}

fn profile_with(edit: impl FnOnce(&mut Profile)) -> Profile {
    let mut p = Profile::from_json(PROFILE_JSON).unwrap();
    edit(&mut p);
    p
}

/// The `contentWindow` of a new same-origin iframe.
fn fresh_frame() -> JsValue {
    eval(
        "(() => { const f = document.createElement('iframe'); \
         document.body.appendChild(f); return f.contentWindow; })()",
    )
}

/// A fresh frame carrying the default profile under `config`, reachable from
/// `eval` as `__personaFrame`.
fn installed_frame(config: OverrideConfig) -> JsValue {
    let frame = fresh_frame();
    OverrideRegistry::new(Profile::from_json(PROFILE_JSON).unwrap(), config)
        .unwrap()
        .install(&frame)
        .unwrap();
    Reflect::set(&js_sys::global(), &"__personaFrame".into(), &frame).unwrap();
    frame
}

/// Asserts `a` and `b` differ only in the low bit of the red channel of every
/// noise-eligible pixel. Returns the number of bytes that moved.
fn red_lsb_differences(a: &[u8], b: &[u8]) -> usize {
    let step = NoiseInjector::DEFAULT_PIXEL_STRIDE * 4;
    assert_eq!(a.len(), b.len());
    let mut moved = 0;
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        if x == y {
            continue;
        }
        assert_eq!(i % step, 0, "byte {} is not the red channel of a noise pixel", i);
        assert_eq!(x ^ y, 1, "red byte {} moved by more than its low bit", i);
        moved += 1;
    }
    moved
}

fn bytes(value: JsValue) -> Vec<u8> {
    value.unchecked_into::<js_sys::Uint8Array>().to_vec()
}

async fn settle(promise: JsValue) -> JsValue {
    JsFuture::from(promise.dyn_into::<Promise>().unwrap())
        .await
        .expect("promise should resolve")
}

// ===== Install =====

#[wasm_bindgen_test]
fn install_reports_applied_units() {
    let result = install();

    let count = get(&result, "count").as_f64().unwrap();
    assert!(count >= 8.0, "Expected at least 8 units applied, got {}", count);

    let applied: Array = get(&result, "applied").unchecked_into();
    let names: Vec<String> = applied.iter().filter_map(|v| v.as_string()).collect();
    for unit in ["navigator", "screen", "plugins", "timezone", "console"] {
        assert!(names.iter().any(|n| n == unit), "{} missing from {:?}", unit, names);
    }
    assert_eq!(get(&get(&result, "profile"), "platform").as_string().as_deref(), Some("Win32"));
}

#[wasm_bindgen_test]
fn install_accepts_object_profile() {
    let obj = js_sys::JSON::parse(PROFILE_JSON).unwrap();
    assert!(overrides::install_profile(obj, JsValue::UNDEFINED).is_ok());
}

#[wasm_bindgen_test]
fn install_twice_is_idempotent() {
    install();
    let first = eval("[navigator.platform, screen.availHeight, innerHeight, navigator.plugins.length].join('|')");
    install();
    let second = eval("[navigator.platform, screen.availHeight, innerHeight, navigator.plugins.length].join('|')");
    assert_eq!(first.as_string(), second.as_string());
}

#[wasm_bindgen_test]
fn malformed_profile_throws_before_patching() {
    let err = overrides::install_profile(JsValue::from_str("{\"platform\": \"Win32\"}"), JsValue::UNDEFINED);
    assert!(err.is_err());

    let placeholder = PROFILE_JSON.replace("\"Win32\"", "\"{{platform}}\"");
    assert!(overrides::install_profile(JsValue::from_str(&placeholder), JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn invalid_options_throw() {
    let options = eval("({ noisePixelStride: 0 })");
    assert!(overrides::install_profile(JsValue::from_str(PROFILE_JSON), options).is_err());
}

#[wasm_bindgen_test]
fn validate_profile_reports_error_info() {
    assert!(overrides::validate_profile(JsValue::from_str(PROFILE_JSON)).is_null());

    let bad = PROFILE_JSON.replace("[\"de-DE\", \"de\", \"en-US\"]", "[]");
    let info = overrides::validate_profile(JsValue::from_str(&bad));
    assert_eq!(get(&info, "code").as_f64(), Some(100.0));
    assert_eq!(get(&info, "isConfigError").as_bool(), Some(true));
}

// ===== Navigator =====

#[wasm_bindgen_test]
fn language_matches_first_language() {
    install();
    assert_eq!(eval("navigator.language").as_string().as_deref(), Some("de-DE"));
    assert_eq!(eval("navigator.language === navigator.languages[0]").as_bool(), Some(true));
    assert_eq!(eval("Object.isFrozen(navigator.languages)").as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn navigator_identity_and_hardware() {
    install();
    assert_eq!(eval("navigator.platform").as_string().as_deref(), Some("Win32"));
    assert_eq!(eval("navigator.vendor").as_string().as_deref(), Some("Google Inc."));
    assert_eq!(eval("navigator.hardwareConcurrency").as_f64(), Some(8.0));
    assert_eq!(eval("navigator.deviceMemory").as_f64(), Some(8.0));
    assert_eq!(eval("navigator.maxTouchPoints").as_f64(), Some(0.0));
}

#[wasm_bindgen_test]
fn webdriver_is_undefined() {
    install();
    assert!(eval("navigator.webdriver").is_undefined());
    assert_eq!(eval("typeof navigator.webdriver").as_string().as_deref(), Some("undefined"));
}

#[wasm_bindgen_test]
fn accessors_look_native() {
    install();
    assert_eq!(eval("Object.getOwnPropertyNames(navigator).length").as_f64(), Some(0.0));

    let d = eval("Object.getOwnPropertyDescriptor(Navigator.prototype, 'platform')");
    assert_eq!(get(&d, "configurable").as_bool(), Some(true));
    assert!(get(&d, "set").is_undefined());
    assert_eq!(
        eval("Object.getOwnPropertyDescriptor(Navigator.prototype, 'platform').get.toString().includes('[native code]')")
            .as_bool(),
        Some(true)
    );

    // Writes are ignored, not thrown.
    eval("navigator.platform = 'Linux x86_64'");
    assert_eq!(eval("navigator.platform").as_string().as_deref(), Some("Win32"));
}

#[wasm_bindgen_test]
fn accessors_can_be_redefined() {
    install();
    let redefined = eval(
        "(() => { try { Object.defineProperty(Navigator.prototype, 'vendor', \
         Object.getOwnPropertyDescriptor(Navigator.prototype, 'vendor')); return true; } \
         catch (e) { return false; } })()",
    );
    assert_eq!(redefined.as_bool(), Some(true));
}

// ===== Screen =====

#[wasm_bindgen_test]
fn screen_dimensions_are_derived() {
    install();
    assert_eq!(eval("screen.width").as_f64(), Some(1920.0));
    assert_eq!(eval("screen.height").as_f64(), Some(1080.0));
    assert_eq!(eval("screen.availHeight === screen.height - 40").as_bool(), Some(true));
    assert_eq!(eval("innerHeight === screen.height - 140").as_bool(), Some(true));
    assert_eq!(eval("outerHeight === screen.availHeight").as_bool(), Some(true));
    assert_eq!(eval("innerWidth === screen.width && outerWidth === screen.width").as_bool(), Some(true));
    assert_eq!(eval("screen.pixelDepth === screen.colorDepth").as_bool(), Some(true));
    assert_eq!(eval("devicePixelRatio").as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
fn screen_dimensions_hold_at_extremes() {
    for (w, h) in [(1u32, 1u32), (7680, 4320)] {
        let frame = fresh_frame();
        let profile = profile_with(|p| {
            p.screen_width = w;
            p.screen_height = h;
        });
        OverrideRegistry::new(profile, OverrideConfig::default())
            .unwrap()
            .install(&frame)
            .unwrap();

        let screen = get(&frame, "screen");
        let height = get(&screen, "height").as_f64().unwrap();
        assert_eq!(height, f64::from(h));
        assert_eq!(get(&screen, "availHeight").as_f64(), Some(height - 40.0));
        assert_eq!(get(&frame, "innerHeight").as_f64(), Some(height - 140.0));
        assert_eq!(get(&frame, "innerWidth").as_f64(), Some(f64::from(w)));
    }
}

#[wasm_bindgen_test]
fn geometry_allowances_are_tunable() {
    let frame = fresh_frame();
    let config = OverrideConfig {
        taskbar_allowance: 48,
        chrome_allowance: 85,
        ..OverrideConfig::default()
    };
    OverrideRegistry::new(Profile::from_json(PROFILE_JSON).unwrap(), config)
        .unwrap()
        .install(&frame)
        .unwrap();
    assert_eq!(get(&get(&frame, "screen"), "availHeight").as_f64(), Some(1032.0));
    assert_eq!(get(&frame, "innerHeight").as_f64(), Some(995.0));
}

// ===== WebGL =====

#[wasm_bindgen_test]
fn webgl_debug_constants_are_spoofed() {
    install();
    let gl = eval("document.createElement('canvas').getContext('webgl')");
    if gl.is_null() {
        return; // no WebGL in this runner
    }
    let get_parameter: js_sys::Function = get(&gl, "getParameter").unchecked_into();
    let vendor = get_parameter.call1(&gl, &JsValue::from_f64(37445.0)).unwrap();
    let renderer = get_parameter.call1(&gl, &JsValue::from_f64(37446.0)).unwrap();
    assert_eq!(vendor.as_string().as_deref(), Some("Google Inc. (NVIDIA)"));
    assert!(renderer.as_string().unwrap().contains("GTX 1660"));

    // Everything else still comes from the driver: compare against a frame
    // nothing was installed into.
    let plain = fresh_frame();
    Reflect::set(&js_sys::global(), &"__personaPlain".into(), &plain).unwrap();
    let unpatched = eval(
        "(() => { const gl = __personaPlain.document.createElement('canvas').getContext('webgl'); \
         return [gl.MAX_TEXTURE_SIZE, gl.MAX_RENDERBUFFER_SIZE, gl.VERSION].map(p => gl.getParameter(p)); })()",
    );
    let unpatched: Array = unpatched.unchecked_into();
    for (i, pname) in [0x0D33u32, 0x84E8, 0x1F02].into_iter().enumerate() {
        let ours = get_parameter.call1(&gl, &JsValue::from_f64(f64::from(pname))).unwrap();
        assert!(
            js_sys::Object::is(&ours, &unpatched.get(i as u32)),
            "parameter {:#x}: {:?} vs {:?}",
            pname,
            ours,
            unpatched.get(i as u32)
        );
    }
    assert_eq!(
        eval("WebGLRenderingContext.prototype.getParameter.toString().includes('[native code]')").as_bool(),
        Some(true)
    );
}

// ===== Canvas =====

#[wasm_bindgen_test]
fn canvas_serialization_is_noisy_but_close() {
    install();
    let canvas = eval(
        "(() => { const c = document.createElement('canvas'); c.width = 100; c.height = 100; \
         const x = c.getContext('2d'); x.fillStyle = '#3366cc'; x.fillRect(0, 0, 100, 100); \
         x.fillStyle = '#ff9900'; x.font = '18px sans-serif'; x.fillText('fingerprint', 5, 50); \
         return c; })()",
    );
    let before: Vec<u8> = pixels(&canvas);

    let to_data_url: js_sys::Function = get(&canvas, "toDataURL").unchecked_into();
    let first = to_data_url.call0(&canvas).unwrap().as_string().unwrap();
    let second = to_data_url.call0(&canvas).unwrap().as_string().unwrap();
    assert_ne!(first, second, "two serializations should not match");

    let after: Vec<u8> = pixels(&canvas);
    assert_eq!(before.len(), after.len());
    for (i, (a, b)) in before.iter().zip(after.iter()).enumerate() {
        if i % 4 == 0 {
            assert!((*a ^ *b) <= 1, "red byte {} moved by more than one bit", i);
        } else {
            assert_eq!(a, b, "non-red byte {} changed", i);
        }
    }
}

fn pixels(canvas: &JsValue) -> Vec<u8> {
    Reflect::set(&js_sys::global(), &"__personaCanvas".into(), canvas).unwrap();
    let data = eval("__personaCanvas.getContext('2d').getImageData(0, 0, 100, 100).data");
    data.unchecked_into::<js_sys::Uint8ClampedArray>().to_vec()
}

#[wasm_bindgen_test]
async fn canvas_to_blob_is_noisy() {
    installed_frame(OverrideConfig {
        image_data: false,
        ..OverrideConfig::default()
    });
    let result = eval(
        "(async () => { const c = __personaFrame.document.createElement('canvas'); c.width = 20; c.height = 20; \
         const x = c.getContext('2d'); x.fillStyle = '#3366cc'; x.fillRect(0, 0, 20, 20); \
         const before = x.getImageData(0, 0, 20, 20).data; \
         const blob = () => new Promise(r => c.toBlob(r)); \
         const first = await blob(); const second = await blob(); \
         const a = new Uint8Array(await first.arrayBuffer()); \
         const b = new Uint8Array(await second.arrayBuffer()); \
         return { size: first.size, same: a.length === b.length && a.every((v, i) => v === b[i]), \
                  before: new Uint8Array(before), after: new Uint8Array(x.getImageData(0, 0, 20, 20).data) }; })()",
    );
    let result = settle(result).await;

    assert!(get(&result, "size").as_f64().unwrap() > 0.0);
    assert_eq!(get(&result, "same").as_bool(), Some(false), "two blobs should not match");
    let moved = red_lsb_differences(&bytes(get(&result, "before")), &bytes(get(&result, "after")));
    assert!(moved > 0, "toBlob left the pixels untouched");
}

#[wasm_bindgen_test]
fn serializing_does_not_bind_a_context() {
    install();
    if eval("document.createElement('canvas').getContext('webgl')").is_null() {
        return; // no WebGL in this runner
    }
    for serialize in ["c.toDataURL()", "c.toBlob(() => {})"] {
        let webgl_after = eval(&format!(
            "(() => {{ const c = document.createElement('canvas'); c.width = 16; c.height = 16; \
             {}; return c.getContext('webgl') !== null; }})()",
            serialize
        ));
        assert_eq!(webgl_after.as_bool(), Some(true), "{} bound a context", serialize);
    }
    // A canvas nobody drew on serializes the same every time.
    assert_eq!(
        eval("(() => { const c = document.createElement('canvas'); return c.toDataURL() === c.toDataURL(); })()")
            .as_bool(),
        Some(true)
    );
}

#[wasm_bindgen_test]
fn image_data_reads_are_noisy() {
    install();
    let reads: Array = eval(
        "(() => { const c = document.createElement('canvas'); c.width = 20; c.height = 20; \
         const x = c.getContext('2d'); x.fillStyle = '#3366cc'; x.fillRect(0, 0, 20, 20); \
         return [0, 1].map(() => new Uint8Array(x.getImageData(0, 0, 20, 20).data)); })()",
    )
    .unchecked_into();
    let moved = red_lsb_differences(&bytes(reads.get(0)), &bytes(reads.get(1)));
    assert!(moved > 0, "two getImageData reads should not match");
    assert_eq!(
        eval("CanvasRenderingContext2D.prototype.getImageData.toString().includes('[native code]')").as_bool(),
        Some(true)
    );
}

#[wasm_bindgen_test]
fn read_pixels_output_is_noisy() {
    installed_frame(OverrideConfig::default());
    let reads = eval(
        "(() => { const c = __personaFrame.document.createElement('canvas'); c.width = 16; c.height = 16; \
         const gl = c.getContext('webgl', { preserveDrawingBuffer: true }); if (!gl) return null; \
         gl.clearColor(0.2, 0.4, 0.8, 1); gl.clear(gl.COLOR_BUFFER_BIT); \
         const read = () => { const p = new Uint8Array(16 * 16 * 4); \
             gl.readPixels(0, 0, 16, 16, gl.RGBA, gl.UNSIGNED_BYTE, p); return p; }; \
         return [read(), read()]; })()",
    );
    if reads.is_null() {
        return; // no WebGL in this runner
    }
    let reads: Array = reads.unchecked_into();
    let (first, second) = (bytes(reads.get(0)), bytes(reads.get(1)));
    assert!(red_lsb_differences(&first, &second) > 0, "two readPixels calls should not match");

    // A uniform clear: pixel 1 is never noise-eligible, so it is the true color.
    let truth = first[4..8].to_vec();
    let uniform: Vec<u8> = truth.iter().copied().cycle().take(first.len()).collect();
    red_lsb_differences(&uniform, &first);
    red_lsb_differences(&uniform, &second);
}

// ===== Plugins =====

#[wasm_bindgen_test]
fn plugin_list_matches_profile() {
    install();
    assert_eq!(eval("navigator.plugins.length").as_f64(), Some(3.0));
    assert_eq!(
        eval("navigator.plugins.namedItem('PDF Viewer').name").as_string().as_deref(),
        Some("PDF Viewer")
    );
    assert!(eval("navigator.plugins.namedItem('nonexistent')").is_null());
    assert_eq!(
        eval("navigator.plugins.item(1).filename").as_string().as_deref(),
        Some("chrome-pdf-viewer.plugin")
    );
    assert!(eval("navigator.plugins.item(3)").is_null());
    assert_eq!(eval("navigator.plugins[2].description === navigator.plugins[2].name").as_bool(), Some(true));
    assert_eq!(eval("navigator.plugins[0].length").as_f64(), Some(1.0));
}

#[wasm_bindgen_test]
fn plugin_list_is_live_and_iterable() {
    install();
    assert_eq!(eval("navigator.plugins !== navigator.plugins").as_bool(), Some(true));
    assert_eq!(
        eval("(() => { const p = navigator.plugins; return p.namedItem('Chrome PDF Viewer') === p[1]; })()").as_bool(),
        Some(true)
    );
    assert_eq!(
        eval("(() => { const p = navigator.plugins; return [...p].map(x => x.name).join() === [...p].map(x => x.name).join(); })()")
            .as_bool(),
        Some(true)
    );
    assert!(eval("navigator.plugins.refresh()").is_undefined());
    if !eval("typeof PluginArray").as_string().unwrap().eq("undefined") {
        assert_eq!(eval("navigator.plugins instanceof PluginArray").as_bool(), Some(true));
    }
}

// ===== Timezone =====

#[wasm_bindgen_test]
fn timezone_is_consistent() {
    install();
    assert_eq!(eval("new Date().getTimezoneOffset()").as_f64(), Some(480.0));
    assert_eq!(
        eval("Intl.DateTimeFormat().resolvedOptions().timeZone").as_string().as_deref(),
        Some("America/Los_Angeles")
    );
    assert_eq!(
        eval("new Intl.DateTimeFormat('en-US').resolvedOptions().timeZone").as_string().as_deref(),
        Some("America/Los_Angeles")
    );
    assert_eq!(eval("new Intl.DateTimeFormat() instanceof Intl.DateTimeFormat").as_bool(), Some(true));
    assert!(eval("new Date(NaN).getTimezoneOffset()").as_f64().unwrap().is_nan());
}

#[wasm_bindgen_test]
fn caller_options_are_not_mutated() {
    install();
    assert_eq!(
        eval("(() => { const o = { hour: 'numeric' }; new Intl.DateTimeFormat('en-US', o); return 'timeZone' in o; })()")
            .as_bool(),
        Some(false)
    );
}

#[wasm_bindgen_test]
fn inherited_options_reach_the_formatter() {
    install();
    let hour_cycle = eval(
        "new Intl.DateTimeFormat('en-US', Object.create({ hour: 'numeric', hourCycle: 'h23' })).resolvedOptions().hourCycle",
    );
    assert_eq!(hour_cycle.as_string().as_deref(), Some("h23"));
}

#[wasm_bindgen_test]
fn time_zone_getter_runs_once() {
    install();
    let reads = eval(
        "(() => { let n = 0; const o = { hour: 'numeric', get timeZone() { n++; return undefined; } }; \
         new Intl.DateTimeFormat('en-US', o); return n; })()",
    );
    assert_eq!(reads.as_f64(), Some(1.0));

    // An explicit zone read through a getter still wins, and is still read once.
    let agrees = eval(
        "(() => { let n = 0; const d = new Date(Date.UTC(2024, 0, 15, 12, 0, 0)); \
         const o = { hour: 'numeric', get timeZone() { n++; return 'Asia/Tokyo'; } }; \
         const s = new Intl.DateTimeFormat('en-US', o).format(d); \
         return n === 1 && s === new Intl.DateTimeFormat('en-US', { hour: 'numeric', timeZone: 'Asia/Tokyo' }).format(d); })()",
    );
    assert_eq!(agrees.as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn locale_strings_use_configured_zone() {
    install();
    let agrees = eval(
        "(() => { const d = new Date(Date.UTC(2024, 0, 15, 12, 0, 0)); \
         return d.toLocaleString('en-US') === d.toLocaleString('en-US', { timeZone: 'America/Los_Angeles' }) \
         && d.toLocaleTimeString('en-US', { hour: 'numeric' }) === d.toLocaleTimeString('en-US', { hour: 'numeric', timeZone: 'America/Los_Angeles' }); })()",
    );
    assert_eq!(agrees.as_bool(), Some(true));
}

// ===== Interceptors =====

#[wasm_bindgen_test]
async fn geolocation_succeeds_with_configured_point() {
    install();
    let position = settle(eval(
        "new Promise((ok, fail) => navigator.geolocation.getCurrentPosition(ok, () => fail('error callback')))",
    ))
    .await;
    let coords = get(&position, "coords");
    assert_eq!(get(&coords, "latitude").as_f64(), Some(37.7749));
    assert_eq!(get(&coords, "longitude").as_f64(), Some(-122.4194));
    assert_eq!(get(&coords, "accuracy").as_f64(), Some(100.0));
    assert!(get(&coords, "altitude").is_null());
    assert!(get(&coords, "speed").is_null());

    let id = eval("navigator.geolocation.watchPosition(() => {})");
    assert_eq!(id.as_f64(), eval("navigator.geolocation.watchPosition(() => {})").as_f64());
    assert!(eval(&format!("navigator.geolocation.clearWatch({})", id.as_f64().unwrap())).is_undefined());
}

#[wasm_bindgen_test]
fn geolocation_untouched_without_coordinates() {
    let frame = fresh_frame();
    let original = Reflect::get(&get(&get(&frame, "Geolocation"), "prototype"), &"getCurrentPosition".into()).unwrap();

    let profile = profile_with(|p| {
        p.latitude = None;
        p.longitude = None;
    });
    let report = OverrideRegistry::new(profile, OverrideConfig::default())
        .unwrap()
        .install(&frame)
        .unwrap();
    assert!(report.skipped.contains(&"geolocation"));

    let after = Reflect::get(&get(&get(&frame, "Geolocation"), "prototype"), &"getCurrentPosition".into()).unwrap();
    assert!(js_sys::Object::is(&original, &after));
}

#[wasm_bindgen_test]
async fn notifications_permission_is_denied() {
    install();
    if eval("typeof navigator.permissions").as_string().as_deref() != Some("object") {
        return;
    }
    let status = settle(eval("navigator.permissions.query({ name: 'notifications' })")).await;
    assert_eq!(get(&status, "state").as_string().as_deref(), Some("denied"));
    assert!(get(&status, "onchange").is_null());

    // Other names still reach the browser.
    let other = settle(eval("navigator.permissions.query({ name: 'geolocation' })")).await;
    assert!(get(&other, "state").as_string().is_some());
}

#[wasm_bindgen_test]
async fn battery_reports_full_and_charging() {
    install();
    if eval("typeof navigator.getBattery").as_string().as_deref() != Some("function") {
        return;
    }
    let battery = settle(eval("navigator.getBattery()")).await;
    assert_eq!(get(&battery, "level").as_f64(), Some(1.0));
    assert_eq!(get(&battery, "charging").as_bool(), Some(true));
    assert_eq!(get(&battery, "dischargingTime").as_f64(), Some(f64::INFINITY));
    assert!(eval("navigator.getBattery().then(b => b.addEventListener('levelchange', () => {}))").is_object());
}

#[wasm_bindgen_test]
fn automation_markers_are_removed() {
    eval("window.cdc_adoQpoasnfa76pfcZLmcfl_Array = []; window.callPhantom = () => {}; document.$cdc_asdjflasutopfhvcZLmcfl_ = 1;");
    install();
    assert_eq!(eval("'cdc_adoQpoasnfa76pfcZLmcfl_Array' in window").as_bool(), Some(false));
    assert_eq!(eval("'callPhantom' in window").as_bool(), Some(false));
    assert_eq!(eval("'$cdc_asdjflasutopfhvcZLmcfl_' in document").as_bool(), Some(false));
}

#[wasm_bindgen_test]
fn chrome_runtime_shape_exists() {
    install();
    assert_eq!(eval("typeof window.chrome").as_string().as_deref(), Some("object"));
    assert_eq!(eval("'runtime' in window.chrome").as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn console_debug_is_silent() {
    install();
    assert!(eval("console.debug('hidden')").is_undefined());
    assert_eq!(eval("console.profile.toString().includes('[native code]')").as_bool(), Some(true));
}

// ===== Status =====

#[wasm_bindgen_test]
fn status_check_agrees_after_install() {
    install();
    let status = overrides::check_override_status(JsValue::from_str(PROFILE_JSON)).unwrap();
    for surface in ["navigator", "screen", "webdriver", "timezone", "intl", "plugins", "nativeToString"] {
        assert_eq!(get(&status, surface).as_bool(), Some(true), "{} check failed", surface);
    }
}
