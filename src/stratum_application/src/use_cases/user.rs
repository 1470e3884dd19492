use std::sync::Arc;

use stratum_core::{
    Broadcast, Injectable, InjectionError, Resolver, User, UserProtocol, UserRepository,
    UserRepositoryError, identifiers,
};

/// Error types specific to user use case
#[derive(Debug, thiserror::Error)]
pub enum UserUseCaseError {
    #[error("User repository error: {0}")]
    UserRepositoryError(#[from] UserRepositoryError),
}

/// User use case - fetches the current user and republishes it
pub struct UserUseCase<R>
where
    R: UserRepository,
{
    user_repository: R,
    stream: Broadcast<User>,
}

impl<R> UserUseCase<R>
where
    R: UserRepository,
{
    pub fn new(user_repository: R) -> Self {
        Self {
            user_repository,
            stream: Broadcast::new(),
        }
    }

    /// Users published by [`UserUseCase::call`]. Subscribing does not trigger a fetch.
    pub fn stream(&self) -> &Broadcast<User> {
        &self.stream
    }

    /// Execute the user use case
    ///
    /// The user is not returned; it is delivered to the subscribers of
    /// [`UserUseCase::stream`]. Concurrent calls are independent and each one
    /// publishes its own result.
    #[tracing::instrument(name = "UserUseCase::call", skip(self))]
    pub async fn call(&self) -> Result<(), UserUseCaseError> {
        let dto = self.user_repository.call().await?;
        let user = UserProtocol::to_domain(dto);

        let notified = self.stream.publish(&user);
        tracing::debug!(notified, "Published user");

        Ok(())
    }
}

impl Injectable for UserUseCase<Arc<dyn UserRepository>> {
    const IDENTIFIER: &'static str = identifiers::USER_USE_CASE;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        Ok(Self::new(
            resolver.resolve::<dyn UserRepository>(identifiers::USER_REPOSITORY)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use stratum_core::{NetworkError, Subscription, UserDto};

    use super::*;

    #[derive(Clone, Default)]
    struct MockUserRepository {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl UserRepository for MockUserRepository {
        async fn call(&self) -> Result<UserDto, UserRepositoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NetworkError::Request("connection refused".to_owned()).into());
            }
            Ok(UserDto::new(format!("Alice {call}"), "a@x.com"))
        }
    }

    fn collect(
        use_case: &UserUseCase<MockUserRepository>,
    ) -> (Arc<Mutex<Vec<User>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = use_case
            .stream()
            .subscribe(move |user: &User| sink.lock().unwrap().push(user.clone()));
        (seen, subscription)
    }

    #[tokio::test]
    async fn test_call_publishes_domain_user() {
        let repository = MockUserRepository::default();
        let use_case = UserUseCase::new(repository);
        let (seen, _subscription) = collect(&use_case);

        use_case.call().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name(), "Alice 0");
        assert_eq!(seen[0].email(), "a@x.com");
    }

    #[tokio::test]
    async fn test_subscribing_does_not_fetch() {
        let repository = MockUserRepository::default();
        let calls = Arc::clone(&repository.calls);
        let use_case = UserUseCase::new(repository);

        let (_seen, _subscription) = collect(&use_case);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_call_republishes() {
        let use_case = UserUseCase::new(MockUserRepository::default());
        let (seen, _subscription) = collect(&use_case);

        let (first, second) = tokio::join!(use_case.call(), use_case.call());
        first.unwrap();
        second.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_publishes_nothing() {
        let repository = MockUserRepository {
            fail: true,
            ..Default::default()
        };
        let use_case = UserUseCase::new(repository);
        let (seen, _subscription) = collect(&use_case);

        let result = use_case.call().await;

        assert!(matches!(
            result,
            Err(UserUseCaseError::UserRepositoryError(UserRepositoryError::Network(_)))
        ));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribed_listener_is_not_notified() {
        let use_case = UserUseCase::new(MockUserRepository::default());
        let (seen, subscription) = collect(&use_case);

        subscription.unsubscribe();
        use_case.call().await.unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }
}
