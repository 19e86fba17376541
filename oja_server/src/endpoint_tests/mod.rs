mod helpers;
mod mocks;
mod orders;
mod status_auth;
mod webhook;
