use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::{
    assemble_financial_data, merge_couple_data, AnalysisImageResult, CalendarImageResult, Couple,
    FinancialData, FinancialRecord, User, UserId, YearMonth, DEFAULT_USER_NAME,
};
use crate::storage::Repository;

use super::{AppError, AvailableMonths, IndividualData, MonthlyView};

/// Application service providing high-level operations for the couple ledger.
/// This is the primary interface for any client (CLI, importers, exporters).
pub struct LedgerService {
    repo: Repository,
}

/// Pairing state of one user.
pub struct CoupleStatus {
    pub user: User,
    pub couple: Option<Couple>,
    pub partner: Option<User>,
}

impl CoupleStatus {
    pub fn is_connected(&self) -> bool {
        self.couple.is_some()
    }
}

/// Recognizer output for one user's month, as handed over by the pipeline.
#[derive(Default)]
pub struct RecognitionInput {
    pub calendar: Option<CalendarImageResult>,
    pub analysis: Option<AnalysisImageResult>,
    pub fallback_year: Option<i32>,
    pub fallback_month: Option<u32>,
    pub recognition_method: String,
    pub image_urls: Vec<String>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "initialized database");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        debug!(database = database_path, "connected to database");
        Ok(Self::new(repo))
    }

    // ========================
    // User operations
    // ========================

    /// Create a new user.
    pub async fn create_user(
        &self,
        name: String,
        avatar_url: Option<String>,
    ) -> Result<User, AppError> {
        if self.repo.get_user_by_name(&name).await?.is_some() {
            return Err(AppError::UserAlreadyExists(name));
        }

        let mut user = User::new(name);
        if let Some(url) = avatar_url {
            user = user.with_avatar_url(url);
        }

        self.repo.save_user(&user).await?;
        info!(user = %user.name, id = %user.id, "created user");
        Ok(user)
    }

    /// Get a user by name.
    pub async fn get_user(&self, name: &str) -> Result<User, AppError> {
        self.repo
            .get_user_by_name(name)
            .await?
            .ok_or_else(|| AppError::UserNotFound(name.to_string()))
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    /// Rename a user and/or change their avatar.
    pub async fn update_profile(
        &self,
        name: &str,
        new_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<User, AppError> {
        let mut user = self.get_user(name).await?;

        if let Some(new_name) = new_name {
            if new_name != user.name && self.repo.get_user_by_name(&new_name).await?.is_some() {
                return Err(AppError::UserAlreadyExists(new_name));
            }
            user.name = new_name;
        }
        if let Some(url) = avatar_url {
            user.avatar_url = Some(url);
        }

        self.repo.update_user(&user).await?;
        info!(user = %user.name, id = %user.id, "updated profile");
        Ok(user)
    }

    // ========================
    // Couple operations
    // ========================

    /// Record that two users share a monthly view.
    pub async fn link_couple(&self, name: &str, partner_name: &str) -> Result<Couple, AppError> {
        let user = self.get_user(name).await?;
        let partner = self.get_user(partner_name).await?;

        if user.id == partner.id {
            return Err(AppError::SelfPairing(user.name));
        }
        if self.repo.get_couple_for_user(user.id).await?.is_some() {
            return Err(AppError::AlreadyInCouple(user.name));
        }
        if self.repo.get_couple_for_user(partner.id).await?.is_some() {
            return Err(AppError::AlreadyInCouple(partner.name));
        }

        let couple = Couple::new(user.id, partner.id);
        self.repo.save_couple(&couple).await?;
        info!(user = %user.name, partner = %partner.name, "linked couple");
        Ok(couple)
    }

    /// Get a user's pairing state and partner profile.
    pub async fn couple_status(&self, name: &str) -> Result<CoupleStatus, AppError> {
        let user = self.get_user(name).await?;
        let couple = self.repo.get_couple_for_user(user.id).await?;

        let partner = match couple.as_ref().and_then(|c| c.partner_of(user.id)) {
            Some(partner_id) => self.repo.get_user(partner_id).await?,
            None => None,
        };

        Ok(CoupleStatus {
            user,
            couple,
            partner,
        })
    }

    /// Dissolve the couple a user belongs to. Both ledgers are kept.
    pub async fn unlink_couple(&self, name: &str) -> Result<Couple, AppError> {
        let (user, couple) = self.require_couple(name).await?;
        self.repo.delete_couple(&couple).await?;
        info!(user = %user.name, "unlinked couple");
        Ok(couple)
    }

    async fn require_couple(&self, name: &str) -> Result<(User, Couple), AppError> {
        let user = self.get_user(name).await?;
        match self.repo.get_couple_for_user(user.id).await? {
            Some(couple) => Ok((user, couple)),
            None => Err(AppError::CoupleRequired(user.name)),
        }
    }

    // ========================
    // Record operations
    // ========================

    /// Store a user's ledger for a month, replacing any earlier upload.
    pub async fn save_record(
        &self,
        name: &str,
        period: YearMonth,
        data: FinancialData,
        image_urls: Vec<String>,
    ) -> Result<FinancialRecord, AppError> {
        let user = self.get_user(name).await?;
        let record = FinancialRecord::new(user.id, period, data).with_image_urls(image_urls);

        let stored = self.repo.upsert_record(&record).await?;
        if stored.id == record.id {
            info!(user = %user.name, %period, "saved record");
        } else {
            info!(user = %user.name, %period, "replaced record");
        }
        Ok(stored)
    }

    /// Assemble recognizer output into a ledger and store it.
    pub async fn save_recognized_record(
        &self,
        name: &str,
        input: RecognitionInput,
    ) -> Result<FinancialRecord, AppError> {
        let (period, data) = assemble_financial_data(
            input.calendar.as_ref(),
            input.analysis.as_ref(),
            input.fallback_year,
            input.fallback_month,
            &input.recognition_method,
            Utc::now(),
        )?;
        debug!(user = name, %period, "assembled recognized ledger");

        self.save_record(name, period, data, input.image_urls).await
    }

    /// Get a user's record for a month.
    pub async fn get_record(&self, name: &str, period: YearMonth) -> Result<FinancialRecord, AppError> {
        let user = self.get_user(name).await?;
        self.repo
            .get_record(user.id, period)
            .await?
            .ok_or(AppError::RecordNotFound {
                user: user.name,
                period,
            })
    }

    /// List a user's records, most recent month first.
    pub async fn list_records(&self, name: &str) -> Result<Vec<FinancialRecord>, AppError> {
        let user = self.get_user(name).await?;
        Ok(self.repo.list_records_for_user(user.id).await?)
    }

    /// Delete a user's record for a month.
    pub async fn delete_record(&self, name: &str, period: YearMonth) -> Result<(), AppError> {
        let user = self.get_user(name).await?;
        if !self.repo.delete_record(user.id, period).await? {
            return Err(AppError::RecordNotFound {
                user: user.name,
                period,
            });
        }
        info!(user = %user.name, %period, "deleted record");
        Ok(())
    }

    // ========================
    // Couple views
    // ========================

    /// Merge both partners' ledgers for a month into the couple view.
    pub async fn monthly_view(&self, name: &str, year: i32, month: u32) -> Result<MonthlyView, AppError> {
        let period = YearMonth::new(year, month)?;
        let (_, couple) = self.require_couple(name).await?;

        let mut records: Vec<FinancialRecord> = Vec::with_capacity(2);
        for member in couple.members() {
            if let Some(record) = self.repo.get_record(member, period).await? {
                records.push(record);
            }
        }

        let mut individuals = BTreeMap::new();
        for record in &records {
            let (user_name, avatar_url) = self.profile_of(record.user_id).await?;
            individuals.insert(
                record.user_id.to_string(),
                IndividualData {
                    user_name,
                    avatar_url,
                    data: record.data.clone(),
                },
            );
        }

        debug!(%period, records = records.len(), "merging couple ledgers");
        let combined_data = merge_couple_data(
            records.first().map(|r| &r.data),
            records.get(1).map(|r| &r.data),
        );

        Ok(MonthlyView {
            combined_data,
            individuals,
            year: period.year,
            month: period.month,
        })
    }

    /// Months for which either partner has a record.
    pub async fn available_months(&self, name: &str) -> Result<AvailableMonths, AppError> {
        let (_, couple) = self.require_couple(name).await?;
        let periods = self
            .repo
            .list_periods_for_users(couple.user1_id, couple.user2_id)
            .await?;

        Ok(AvailableMonths {
            available_months: periods.iter().map(YearMonth::to_string).collect(),
        })
    }

    async fn profile_of(&self, user_id: UserId) -> Result<(String, Option<String>), AppError> {
        match self.repo.get_user(user_id).await? {
            Some(user) => Ok((user.name, user.avatar_url)),
            None => {
                warn!(%user_id, "record owner has no profile");
                Ok((DEFAULT_USER_NAME.to_string(), None))
            }
        }
    }
}
