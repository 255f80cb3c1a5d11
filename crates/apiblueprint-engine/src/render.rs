//! Renders description fields from Markdown to HTML.

use pulldown_cmark::{Options, Parser, html};

use crate::ast::{Blueprint, Parameter, Payload};

pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn render(description: &mut String) {
    *description = markdown_to_html(description);
}

fn render_payload(payload: &mut Payload) {
    render(&mut payload.description);
    render_parameters(&mut payload.parameters);
}

fn render_parameters(parameters: &mut [Parameter]) {
    for parameter in parameters {
        render(&mut parameter.description);
    }
}

/// Replaces every description in the tree with its HTML rendering.
pub fn render_descriptions(blueprint: &mut Blueprint) {
    render(&mut blueprint.description);
    for group in &mut blueprint.resource_groups {
        render(&mut group.description);
        for resource in &mut group.resources {
            render(&mut resource.description);
            render_parameters(&mut resource.parameters);
            if let Some(model) = &mut resource.model {
                render_payload(model);
            }
            for action in &mut resource.actions {
                render(&mut action.description);
                render_parameters(&mut action.parameters);
                for example in &mut action.examples {
                    render(&mut example.description);
                    example
                        .requests
                        .iter_mut()
                        .chain(example.responses.iter_mut())
                        .for_each(render_payload);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Resource, ResourceGroup};
    use insta::assert_snapshot;

    #[test]
    fn renders_inline_markup() {
        assert_snapshot!(markdown_to_html("Hello *world*\n").trim_end(), @"<p>Hello <em>world</em></p>");
    }

    #[test]
    fn empty_descriptions_stay_empty() {
        assert_eq!(markdown_to_html("  \n"), "");
    }

    #[test]
    fn walks_nested_entities() {
        let mut blueprint = Blueprint {
            description: "# Intro\n".to_string(),
            resource_groups: vec![ResourceGroup {
                resources: vec![Resource {
                    description: "`code`".to_string(),
                    ..Resource::default()
                }],
                ..ResourceGroup::default()
            }],
            ..Blueprint::default()
        };

        render_descriptions(&mut blueprint);

        assert_eq!(blueprint.description, "<h1>Intro</h1>\n");
        assert_eq!(
            blueprint.resource_groups[0].resources[0].description,
            "<p><code>code</code></p>\n"
        );
    }
}
