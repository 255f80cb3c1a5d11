use std::fmt;

/// Every semantic region the classifier can assign to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionType {
    /// No recognized signature: description text or unexpected content.
    Undefined,
    Blueprint,
    ResourceGroup,
    Resource,
    Action,
    Parameters,
    ParameterDefinition,
    ParameterValues,
    Relation,
    Headers,
    Request,
    /// Request without nested asset sections; its content is the body.
    RequestBody,
    Response,
    ResponseBody,
    Model,
    ModelBody,
    Body,
    Schema,
    Attributes,
    /// A recognized construct placed where it does not belong.
    Foreign,
    /// Unconditionally ends the enclosing section (horizontal rule).
    Terminator,
}

impl SectionType {
    /// Request, response and model sections, abbreviated or not.
    pub fn is_payload(self) -> bool {
        matches!(
            self,
            SectionType::Request
                | SectionType::RequestBody
                | SectionType::Response
                | SectionType::ResponseBody
                | SectionType::Model
                | SectionType::ModelBody
        )
    }

    pub fn is_request(self) -> bool {
        matches!(self, SectionType::Request | SectionType::RequestBody)
    }

    pub fn is_response(self) -> bool {
        matches!(self, SectionType::Response | SectionType::ResponseBody)
    }

    pub fn is_model(self) -> bool {
        matches!(self, SectionType::Model | SectionType::ModelBody)
    }

    /// The abbreviated form of a payload section.
    pub fn abbreviated(self) -> SectionType {
        match self {
            SectionType::Request => SectionType::RequestBody,
            SectionType::Response => SectionType::ResponseBody,
            SectionType::Model => SectionType::ModelBody,
            other => other,
        }
    }

    pub fn is_abbreviated_payload(self) -> bool {
        matches!(
            self,
            SectionType::RequestBody | SectionType::ResponseBody | SectionType::ModelBody
        )
    }

    /// Lowercase name used in diagnostic messages.
    pub fn name(self) -> &'static str {
        match self {
            SectionType::Undefined => "undefined",
            SectionType::Blueprint => "blueprint",
            SectionType::ResourceGroup => "resource group",
            SectionType::Resource => "resource",
            SectionType::Action => "action",
            SectionType::Parameters => "parameters",
            SectionType::ParameterDefinition => "parameter",
            SectionType::ParameterValues => "values",
            SectionType::Relation => "relation",
            SectionType::Headers => "headers",
            SectionType::Request | SectionType::RequestBody => "request",
            SectionType::Response | SectionType::ResponseBody => "response",
            SectionType::Model | SectionType::ModelBody => "model",
            SectionType::Body => "body",
            SectionType::Schema => "schema",
            SectionType::Attributes => "attributes",
            SectionType::Foreign => "foreign",
            SectionType::Terminator => "terminator",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
