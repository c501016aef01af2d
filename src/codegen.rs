//! Component-module code generation.
//!
//! Wraps the raw component script into a complete, self-contained module
//! for the bundler. This is a pure string transform over an accumulating
//! buffer; the steps run in a fixed order because each one rewrites text
//! the next step inspects:
//!
//! 1. scan the raw script's imports for the framework root package;
//! 2. prepend the stylesheet / directive / state-management imports, plus
//!    a default framework import when step 1 found none;
//! 3. rename the `WizComponent` placeholder to the package title and
//!    append the default export;
//! 4. swap the last render marker (`return WizComponent;`, which step 3
//!    renamed to `return <title>;`) for the directive-wrapped markup;
//! 5. prepend the runtime-helper prologue with the component name and
//!    package id substituted.
//!
//! Malformed scripts produce malformed output: user code is not statically
//! checked here.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Warning, WARN_RENDER_MARKER_MISSING};

/// Placeholder symbol authors use for their component. Renamed to the
/// package title during generation.
pub const COMPONENT_PLACEHOLDER: &str = "WizComponent";

/// Framework root package checked for in step 1.
const FRAMEWORK_PACKAGE: &str = "react";

lazy_static! {
    static ref IMPORT_RE: Regex =
        Regex::new(r#"import\s+.+\s+from\s+['"]([^'"]+)['"];?"#).unwrap();
}

/// Per-package runtime helper. `<COMPONENT>` and `<APP_ID>` are substituted
/// so every compiled module gets a privately scoped instance.
const RUNTIME_PROLOGUE: &str = r#"/* wiz runtime helper for <COMPONENT>.
 * API(name, options) issues a fetch against this package's endpoint;
 * extra options follow the Fetch API.
 */

const __init<COMPONENT>__ = () => {
    const defaultOptions = {
        method: "GET",
        headers: {
            Accept: "application/json",
            "Content-Type": "application/json",
        },
    };

    const __onError__ = (err) => {
        console.error(err);
    };

    const URI = (apiName) => {
        return `/app/api/<APP_ID>/${apiName}`;
    };

    const API = async (apiName, options = {}, json = true, errorDefault = null, onError = __onError__) => {
        const opts = {
            ...defaultOptions,
            ...options,
        };
        try {
            let res = await fetch(URI(apiName), opts);
            if (!json) return res;
            const { code, data } = await res.json();
            if (!/^20[0124]$/.test(code)) {
                throw new Error(data);
            }
            return data;
        } catch (err) {
            onError(err);
            return errorDefault;
        }
    };

    return {
        API,
        lang: () => {
            return navigator.language;
        },
    };
};
const wiz = __init<COMPONENT>__();

"#;

#[derive(Debug, Clone)]
pub struct GeneratedModule {
    pub code: String,
    pub warnings: Vec<Warning>,
}

/// Generate the complete component module for one package.
pub fn generate(
    id: &str,
    title: &str,
    script: &str,
    markup: &str,
    has_style: bool,
) -> GeneratedModule {
    let mut warnings = Vec::new();

    // Step 1: does the raw script already import the framework?
    let has_framework_import = IMPORT_RE
        .captures_iter(script)
        .any(|cap| &cap[1] == FRAMEWORK_PACKAGE);

    // Step 2: header imports, innermost prepended first.
    let mut code = script.to_string();
    if has_style {
        code = format!("import \"./view.style\";\n{}", code);
    }
    code = format!("import Directive from \"WizDirective\";\n{}", code);
    code = format!(
        "import {{ useRecoilState as wizState, useRecoilValue as wizValue }} from \"recoil\";\n{}",
        code
    );
    if !has_framework_import {
        code = format!("import React from \"react\";\n{}", code);
    }

    // Step 3: placeholder rename + default export.
    code = code.replace(COMPONENT_PLACEHOLDER, title);
    code.push_str(&format!("\nexport default {}", title));

    // Step 4: last render marker becomes the directive-wrapped markup.
    // The marker was authored as `return WizComponent;` and carries the
    // title after step 3, so that is the form matched here.
    let marker_re = Regex::new(&format!(r"return\s+{}\b\s*;?", regex::escape(title)))
        .expect("escaped title is a valid pattern");
    let last = marker_re.find_iter(&code).last().map(|m| m.range());
    match last {
        Some(range) => {
            let wrapped = format!("return (<Directive>\n{}\n</Directive>);", markup);
            code.replace_range(range, &wrapped);
        }
        None => warnings.push(Warning::new(
            WARN_RENDER_MARKER_MISSING,
            format!(
                "component script for `{}` has no `return {};` marker; markup was not injected",
                id, COMPONENT_PLACEHOLDER
            ),
        )),
    }

    // Step 5: runtime prologue on top.
    let prologue = RUNTIME_PROLOGUE
        .replace("<COMPONENT>", title)
        .replace("<APP_ID>", id);
    code = format!("{}{}", prologue, code);

    GeneratedModule { code, warnings }
}
