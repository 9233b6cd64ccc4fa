use std::future::Future;

use shared::types::{Alias, PostAlias, PutAlias};

use crate::error::ClientError;

/// The REST surface the stores and the navigation guard talk to.
///
/// [`super::HttpBackend`] is the real implementation; tests swap in a
/// scripted one.
pub trait Backend: Send + Sync + 'static {
    /// `GET /alias`
    fn list_aliases(&self) -> impl Future<Output = Result<Vec<Alias>, ClientError>> + Send;

    /// `POST /alias`, answering with the stored alias.
    fn create_alias(
        &self,
        form: &PostAlias,
    ) -> impl Future<Output = Result<Alias, ClientError>> + Send;

    /// `PUT /alias/{name}`
    fn update_alias(
        &self,
        name: &str,
        form: &PutAlias,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// `DELETE /alias/{name}`
    fn delete_alias(&self, name: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// `GET /account/login`. Returns where the identity provider wants the
    /// user sent, if the backend answered with a redirect.
    fn login_redirect(&self) -> impl Future<Output = Result<Option<String>, ClientError>> + Send;

    /// `GET /auth/authorize?redirect_uri=&token=`
    fn authorize(
        &self,
        redirect_uri: &str,
        token: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// `POST /auth/logout`
    fn logout(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}
