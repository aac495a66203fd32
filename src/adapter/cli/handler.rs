use std::sync::Arc;

use anyhow::Result;

use crate::adapter::app_state::AppState;
use crate::adapter::cli::presenter::MemberPresenter;
use crate::adapter::cli::Command;
use crate::core::domain::entity::member::member::UnvalidatedMember;
use crate::core::domain::execution::ExecutionContext;

pub struct MemberHandler {
    state: Arc<AppState>,
    json: bool,
}

impl MemberHandler {
    pub fn new(state: Arc<AppState>, json: bool) -> Self {
        Self { state, json }
    }

    /// Run one command in its own execution context and render the result.
    pub async fn handle(&self, command: Command) -> Result<String> {
        let ctx = ExecutionContext::new();
        let mut presenter = MemberPresenter::new(self.json);
        let manager = &self.state.transaction_manager;
        let repository = self.state.member_repository.clone();

        match command {
            Command::Save { member_id, money } => {
                let input = UnvalidatedMember { member_id, money };
                self.state
                    .register_member_use_case
                    .execute(&ctx, input, &mut presenter)
                    .await?;
                Ok(presenter.render_output()?)
            }
            Command::Find { member_id } => {
                let member = manager
                    .run_transactional(&ctx, |ctx| async move {
                        repository.find_by_id(&ctx, &member_id).await
                    })
                    .await?;
                Ok(presenter.render(&member)?)
            }
            Command::Update { member_id, money } => {
                let member = manager
                    .run_transactional(&ctx, |ctx| async move {
                        repository.update(&ctx, &member_id, money).await?;
                        repository.find_by_id(&ctx, &member_id).await
                    })
                    .await?;
                Ok(presenter.render(&member)?)
            }
            Command::Deposit { member_id, delta } => {
                let member = manager
                    .run_transactional(&ctx, |ctx| async move {
                        repository.update_by(&ctx, &member_id, delta).await
                    })
                    .await?;
                Ok(presenter.render(&member)?)
            }
            Command::Delete { member_id } => {
                let deleted = member_id.clone();
                manager
                    .run_transactional(&ctx, |ctx| async move {
                        repository.delete(&ctx, &member_id).await
                    })
                    .await?;
                Ok(format!("deleted {}", deleted))
            }
        }
    }
}
