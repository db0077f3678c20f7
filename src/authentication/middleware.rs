use warp::{reject::Rejection, Filter};

use super::jwt::{verify_jwt_session, SessionData};

/// Extracts the caller's session from the `session` cookie; a missing or invalid token yields `None`.
pub fn with_possible_session(
    secret: String,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>("session").map(move |session: Option<String>| {
        let session = session?;

        match verify_jwt_session(session, &secret) {
            Ok(data) => {
                let session: SessionData = data.into();
                Some(session)
            }
            Err(e) => {
                log::debug!("> Ignoring session cookie: {:?}", e.info);
                None
            }
        }
    })
}
