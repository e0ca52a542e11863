//! Общие контракты backend'а синхронизации каталога:
//! агрегаты, DTO use case'ов и системные типы.

pub mod domain;
pub mod shared;
pub mod system;
pub mod usecases;
