/// Parser switches. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat a missing API name as an error instead of a warning.
    pub require_blueprint_name: bool,
    /// Populate the source map tree. When off every source map stays empty.
    pub export_source_map: bool,
    /// Render description fields from Markdown to HTML after parsing.
    pub render_descriptions: bool,
}

impl ParseOptions {
    pub fn with_source_map(mut self) -> Self {
        self.export_source_map = true;
        self
    }

    pub fn requiring_name(mut self) -> Self {
        self.require_blueprint_name = true;
        self
    }

    pub fn rendering_descriptions(mut self) -> Self {
        self.render_descriptions = true;
        self
    }
}
