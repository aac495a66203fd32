use crate::core::domain::entity::member::Member;
use crate::core::port::register_member::{
    RegisterMemberOutputBoundary, RegisterMemberOutputError,
};

pub struct MemberPresenter {
    json: bool,
    pub(crate) output: Option<Member>,
}

impl MemberPresenter {
    pub fn new(json: bool) -> Self {
        Self { json, output: None }
    }

    pub fn render(&self, member: &Member) -> Result<String, RegisterMemberOutputError> {
        if self.json {
            serde_json::to_string(member)
                .map_err(|e| RegisterMemberOutputError::FormatError(e.to_string()))
        } else {
            Ok(format!("{}\t{}", member.member_id, member.money))
        }
    }

    /// Render whatever the use case reported.
    pub fn render_output(&self) -> Result<String, RegisterMemberOutputError> {
        match &self.output {
            Some(member) => self.render(member),
            None => Err(RegisterMemberOutputError::InvalidStateError(
                "output not set by use case".to_string(),
            )),
        }
    }
}

impl RegisterMemberOutputBoundary for MemberPresenter {
    fn execute(&mut self, output: Member) -> Result<(), RegisterMemberOutputError> {
        self.output = Some(output);
        Ok(())
    }
}
