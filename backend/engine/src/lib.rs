//! Rules engine for the Ticket to Ride board game.
//!
//! A [`session::GameSession`] owns one game. Players act through
//! [`session::GameSession::apply`], which runs every [`action::Action`] through the
//! [`turn::TurnActionEngine`]: invalid actions are refused without changing anything,
//! and claimed routes are published to the [`event::ConquestEventBus`].

pub mod action;
pub mod card;
pub mod city;
pub mod deck;
pub mod display;
pub mod error;
pub mod event;
pub mod map;
pub mod observer;
pub mod player;
pub mod scoring;
pub mod session;
pub mod ticket;
pub mod turn;
pub mod validator;

#[macro_use]
extern crate lazy_static;
