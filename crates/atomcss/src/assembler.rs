//! Output assembly.
//!
//! Turns resolved utilities into CSS text. Assembly is a pure function of
//! its inputs and never looks at the order tokens arrived in:
//!
//! 1. utilities are partitioned by layer
//! 2. within a layer they are stable-sorted by `(rank, sort, token)`
//! 3. utilities sharing parents and selector concatenate their bodies
//! 4. groups with identical bodies merge their selectors
//! 5. groups are bucketed by parent chain, the un-wrapped bucket first
//! 6. layers are emitted by `(priority, name)`

use std::collections::BTreeSet;

use crate::resolver::ResolvedUtil;

/// Switches controlling serialization.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions<'a> {
    pub minify: bool,
    /// Prefixed to every selector, followed by a space.
    pub scope: Option<&'a str>,
    pub merge_selectors: bool,
    /// Wrap layers in `@layer` blocks instead of comment markers.
    pub native_layers: bool,
}

/// Raw CSS placed at the start of a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightBlock {
    pub layer: String,
    pub css: String,
}

/// The serialized text of one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerBlock {
    pub name: String,
    pub priority: i32,
    /// Full text including the layer marker or wrapper.
    pub css: String,
}

/// Output of [`assemble`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembled {
    pub css: String,
    /// Layers in output order.
    pub layers: Vec<LayerBlock>,
}

#[derive(Debug, Clone)]
struct Group {
    parents: Vec<String>,
    parent_order: i32,
    selectors: Vec<String>,
    body: String,
    /// Bodies concatenated into `body`, one per member utility.
    parts: Vec<String>,
    /// No selector: `body` is emitted verbatim.
    raw: bool,
    mergeable: bool,
}

impl Group {
    fn render(&self, scope: Option<&str>) -> String {
        if self.raw {
            return self.body.clone();
        }
        let selectors: Vec<String> = self
            .selectors
            .iter()
            .map(|selector| match scope {
                Some(scope) => format!("{} {}", scope, selector),
                None => selector.clone(),
            })
            .collect();
        format!("{}{{{}}}", selectors.join(","), self.body)
    }
}

/// Sorts a layer's utilities and folds them into groups.
fn group_layer(mut utils: Vec<&ResolvedUtil>, merge_selectors: bool) -> Vec<Group> {
    utils.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then(a.sort.cmp(&b.sort))
            .then_with(|| a.token.cmp(&b.token))
    });

    let mut groups: Vec<Group> = Vec::new();
    for util in utils {
        let Some(selector) = &util.selector else {
            groups.push(Group {
                parents: util.parents.clone(),
                parent_order: util.parent_order,
                selectors: Vec::new(),
                body: util.body.clone(),
                parts: vec![util.body.clone()],
                raw: true,
                mergeable: false,
            });
            continue;
        };

        if !util.no_merge {
            let existing = groups.iter_mut().find(|g| {
                g.mergeable && !g.raw && g.parents == util.parents && g.selectors[0] == *selector
            });
            if let Some(group) = existing {
                if !group.parts.contains(&util.body) {
                    group.body.push_str(&util.body);
                    group.parts.push(util.body.clone());
                }
                continue;
            }
        }

        groups.push(Group {
            parents: util.parents.clone(),
            parent_order: util.parent_order,
            selectors: vec![selector.clone()],
            body: util.body.clone(),
            parts: vec![util.body.clone()],
            raw: false,
            mergeable: !util.no_merge,
        });
    }

    if !merge_selectors {
        return groups;
    }

    let mut merged: Vec<Group> = Vec::with_capacity(groups.len());
    for group in groups {
        if group.mergeable {
            let twin = merged
                .iter_mut()
                .find(|m| m.mergeable && m.parents == group.parents && m.body == group.body);
            if let Some(twin) = twin {
                for selector in group.selectors {
                    if !twin.selectors.contains(&selector) {
                        twin.selectors.push(selector);
                    }
                }
                continue;
            }
        }
        merged.push(group);
    }
    merged
}

/// Wraps `inner` in the given at-rules, outermost first.
fn wrap_parents(parents: &[String], inner: String, sep: &str) -> String {
    parents.iter().rev().fold(inner, |body, parent| {
        format!("{}{{{}{}{}}}", parent, sep, body, sep)
    })
}

fn render_layer(
    name: &str,
    preflights: &[&PreflightBlock],
    groups: Vec<Group>,
    options: &AssembleOptions<'_>,
) -> String {
    let sep = if options.minify { "" } else { "\n" };

    let mut lines: Vec<String> = preflights
        .iter()
        .map(|p| p.css.trim().to_string())
        .filter(|css| !css.is_empty())
        .collect();

    // Bucket by parent chain, keeping group order inside each bucket.
    let mut buckets: Vec<(Vec<String>, i32, Vec<Group>)> = Vec::new();
    for group in groups {
        match buckets.iter_mut().find(|(parents, _, _)| *parents == group.parents) {
            Some((_, _, members)) => members.push(group),
            None => buckets.push((group.parents.clone(), group.parent_order, vec![group])),
        }
    }
    buckets.sort_by(|(a, a_order, _), (b, b_order, _)| {
        a.is_empty()
            .cmp(&b.is_empty())
            .reverse()
            .then(a_order.cmp(b_order))
            .then_with(|| a.join(" ").cmp(&b.join(" ")))
    });

    for (parents, _, members) in buckets {
        let rendered: Vec<String> = members.iter().map(|g| g.render(options.scope)).collect();
        if parents.is_empty() {
            lines.extend(rendered);
        } else {
            lines.push(wrap_parents(&parents, rendered.join(sep), sep));
        }
    }

    let body = lines.join(sep);
    if options.native_layers {
        format!("@layer {}{{{}{}{}}}", name, sep, body, sep)
    } else if options.minify {
        body
    } else {
        format!("/* layer: {} */\n{}", name, body)
    }
}

/// Assembles utilities and preflights into CSS.
///
/// `priority` maps a layer name to its priority; layers sort by
/// `(priority, name)`.
pub fn assemble(
    utils: &[ResolvedUtil],
    preflights: &[PreflightBlock],
    priority: impl Fn(&str) -> i32,
    options: &AssembleOptions<'_>,
) -> Assembled {
    let names: BTreeSet<&str> = utils
        .iter()
        .map(|u| u.layer.as_str())
        .chain(preflights.iter().map(|p| p.layer.as_str()))
        .collect();
    let mut names: Vec<(i32, &str)> = names.into_iter().map(|n| (priority(n), n)).collect();
    names.sort();

    let mut layers = Vec::with_capacity(names.len());
    for (layer_priority, name) in names {
        let layer_utils: Vec<&ResolvedUtil> = utils.iter().filter(|u| u.layer == name).collect();
        let layer_preflights: Vec<&PreflightBlock> =
            preflights.iter().filter(|p| p.layer == name).collect();
        let groups = group_layer(layer_utils, options.merge_selectors);
        if groups.is_empty() && layer_preflights.iter().all(|p| p.css.trim().is_empty()) {
            continue;
        }
        layers.push(LayerBlock {
            name: name.to_string(),
            priority: layer_priority,
            css: render_layer(name, &layer_preflights, groups, options),
        });
    }

    let sep = if options.minify { "" } else { "\n" };
    let css = layers
        .iter()
        .map(|layer| layer.css.as_str())
        .collect::<Vec<_>>()
        .join(sep);
    Assembled { css, layers }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn util(token: &str, rank: i64, body: &str) -> ResolvedUtil {
        ResolvedUtil {
            token: token.to_string(),
            rank,
            selector: Some(format!(".{}", token)),
            parents: Vec::new(),
            parent_order: 0,
            body: body.to_string(),
            layer: "default".to_string(),
            sort: 0,
            no_merge: false,
        }
    }

    fn options() -> AssembleOptions<'static> {
        AssembleOptions {
            merge_selectors: true,
            ..Default::default()
        }
    }

    #[test]
    fn sorts_by_rank_then_token() {
        let utils = vec![util("m-4", 0, "margin:4px;"), util("m-2", 0, "margin:2px;"), util("a", -1, "x:y;")];
        let out = assemble(&utils, &[], |_| 0, &options());
        assert_eq!(
            out.css,
            "/* layer: default */\n.a{x:y;}\n.m-2{margin:2px;}\n.m-4{margin:4px;}"
        );
    }

    #[test]
    fn identical_bodies_merge_selectors() {
        let utils = vec![util("a", 0, "c:d;"), util("b", 1, "c:d;")];
        let out = assemble(&utils, &[], |_| 0, &options());
        assert_eq!(out.css, "/* layer: default */\n.a,.b{c:d;}");

        let mut keep = util("b", 1, "c:d;");
        keep.no_merge = true;
        let out = assemble(&[util("a", 0, "c:d;"), keep], &[], |_| 0, &options());
        assert_eq!(out.css, "/* layer: default */\n.a{c:d;}\n.b{c:d;}");
    }

    #[test]
    fn shared_selector_concatenates_bodies() {
        let mut second = util("a", 0, "e:f;");
        second.rank = 1;
        let out = assemble(&[util("a", 0, "c:d;"), second], &[], |_| 0, &options());
        assert_eq!(out.css, "/* layer: default */\n.a{c:d;e:f;}");
    }

    #[test]
    fn overlapping_bodies_both_survive() {
        let out = assemble(
            &[
                util("w-1", 0, "border-width:1px;"),
                util("w-1", 1, "width:1px;"),
                util("w-1", 2, "width:1px;"),
            ],
            &[],
            |_| 0,
            &AssembleOptions {
                minify: true,
                ..options()
            },
        );
        assert_eq!(out.css, ".w-1{border-width:1px;width:1px;}");

        let custom = util("m-1", 1, "--x-margin:1px;");
        let out = assemble(&[custom, util("m-1", 0, "margin:1px;")], &[], |_| 0, &options());
        assert_eq!(out.css, "/* layer: default */\n.m-1{margin:1px;--x-margin:1px;}");
    }

    #[test]
    fn parent_buckets_follow_plain_rules() {
        let mut wide = util("md-a", 1, "x:1;");
        wide.parents = vec!["@media (min-width: 768px)".to_string()];
        wide.parent_order = 2;
        let mut narrow = util("sm-a", 1, "x:2;");
        narrow.parents = vec!["@media (min-width: 640px)".to_string()];
        narrow.parent_order = 1;
        let out = assemble(&[wide, narrow, util("a", 5, "x:0;")], &[], |_| 0, &AssembleOptions {
            minify: true,
            ..options()
        });
        assert_eq!(
            out.css,
            ".a{x:0;}@media (min-width: 640px){.sm-a{x:2;}}@media (min-width: 768px){.md-a{x:1;}}"
        );
    }

    #[test]
    fn layers_order_by_priority_and_wrap_natively() {
        let mut pre = util("p", 0, "a:b;");
        pre.layer = "pre".to_string();
        let out = assemble(
            &[util("d", 0, "a:c;"), pre],
            &[PreflightBlock {
                layer: "preflights".to_string(),
                css: "*{margin:0;}".to_string(),
            }],
            |name| match name {
                "pre" => -10,
                "preflights" => i32::MAX,
                _ => 0,
            },
            &AssembleOptions {
                native_layers: true,
                ..options()
            },
        );
        let names: Vec<_> = out.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["pre", "default", "preflights"]);
        assert_eq!(out.layers[0].css, "@layer pre{\n.p{a:b;}\n}");
    }

    #[test]
    fn scope_prefixes_selectors() {
        let out = assemble(&[util("a", 0, "c:d;")], &[], |_| 0, &AssembleOptions {
            scope: Some(".root"),
            minify: true,
            ..options()
        });
        assert_eq!(out.css, ".root .a{c:d;}");
    }
}
