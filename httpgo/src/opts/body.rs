/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use url::form_urlencoded;

pub(super) const MIME_APPLICATION_JSON: &str = "application/json";
pub(super) const MIME_APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

#[derive(Debug, PartialEq, Eq)]
pub(super) enum ArgsBody {
    Json(String),
    Form(String),
}

/// Build the request body from the positional `key:=value` or `key=value` arguments.
pub(super) fn build_args_body(args: &[String]) -> Option<ArgsBody> {
    if args.is_empty() {
        return None;
    }
    if is_json_args(args) {
        Some(ArgsBody::Json(build_json_body(args)))
    } else {
        Some(ArgsBody::Form(build_form_body(args)))
    }
}

fn is_json_args(args: &[String]) -> bool {
    args.iter().filter(|a| !a.is_empty()).all(|a| {
        match (a.find('='), a.find(":=")) {
            (Some(form_eq), Some(json_eq)) => form_eq >= json_eq,
            _ => false,
        }
    })
}

fn quoted(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn need_quote(v: &str) -> bool {
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false") {
        return false;
    }
    if i64::from_str(v).is_ok() || f64::from_str(v).is_ok() {
        return false;
    }

    let b = v.as_bytes();
    if b.len() <= 1 {
        return true;
    }
    let (first, last) = (b[0], b[b.len() - 1]);
    !((first == b'[' && last == b']') || (first == b'{' && last == b'}'))
}

fn build_json_body(args: &[String]) -> String {
    let mut fields = Vec::with_capacity(args.len());
    for arg in args {
        let Some((k, v)) = arg.split_once(":=") else {
            continue;
        };
        let (k, v) = (k.trim(), v.trim());
        if k.is_empty() {
            continue;
        }
        let v = if need_quote(v) {
            quoted(v)
        } else {
            v.to_string()
        };
        fields.push(format!("{}:{v}", quoted(k)));
    }
    format!("{{{}}}", fields.join(","))
}

fn build_form_body(args: &[String]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for arg in args {
        match arg.split_once('=') {
            Some((k, v)) => {
                let k = k.trim();
                if !k.is_empty() {
                    serializer.append_pair(k, v.trim());
                }
            }
            None => {
                let k = arg.trim();
                if !k.is_empty() {
                    serializer.append_key_only(k);
                }
            }
        }
    }
    serializer.finish()
}
