//! JS-level stealth injected before any navigation.
//!
//! Process-level defaults (flags, user agent) live in `browser_manager`; this
//! script hides the remaining automation fingerprints the target page checks
//! from JavaScript.

/// Script registered with `Page.addScriptToEvaluateOnNewDocument`.
pub fn stealth_script() -> &'static str {
    r#"
(() => {
    const proto = Navigator.prototype;

    // webdriver: prefer "absent" (undefined) over false
    try {
        Object.defineProperty(proto, 'webdriver', { get: () => undefined, configurable: true });
    } catch (e) {}
    try { delete navigator.webdriver; } catch (e) {}

    try {
        Object.defineProperty(proto, 'languages', { get: () => ['en-US', 'en'], configurable: true });
    } catch (e) {}

    try {
        Object.defineProperty(proto, 'plugins', {
            get: () => [
                { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
                { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
                { name: 'Native Client', filename: 'internal-nacl-plugin' },
            ],
            configurable: true,
        });
    } catch (e) {}

    // window.chrome is missing in automation-launched Chromium
    if (!window.chrome) {
        window.chrome = { runtime: {}, loadTimes: function () {}, csi: function () {} };
    }

    // Notification permission query is a classic headless tell
    try {
        const originalQuery = window.navigator.permissions.query;
        window.navigator.permissions.query = (parameters) =>
            parameters && parameters.name === 'notifications'
                ? Promise.resolve({ state: Notification.permission })
                : originalQuery(parameters);
    } catch (e) {}

    try {
        const getParameter = WebGLRenderingContext.prototype.getParameter;
        WebGLRenderingContext.prototype.getParameter = function (parameter) {
            if (parameter === 37445) return 'Intel Inc.';
            if (parameter === 37446) return 'Intel Iris OpenGL Engine';
            return getParameter.apply(this, arguments);
        };
    } catch (e) {}
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_hides_webdriver_flag() {
        let script = stealth_script();
        assert!(script.contains("'webdriver'"));
        assert!(script.trim_start().starts_with("(() =>"));
    }
}
