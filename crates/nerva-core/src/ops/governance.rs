use crate::{
    Error,
    cdk::{
        candid::Principal,
        spec::sns::governance::{
            AddNeuronPermissions, Amount, By, ClaimOrRefresh, Command, CommandResponse,
            Configure, Disburse, DisburseMaturity, DisburseMaturityResponse, Empty, GetNeuron,
            GetNeuronResult, GovernanceAccount, ListNeurons, ManageNeuron, MemoAndController,
            NeuronId, Operation, RemoveNeuronPermissions, Split, error_type,
        },
        types::{Account, Subaccount, Tokens},
    },
    domain::{
        neuron::NeuronSnapshot, params::StakingParameters, permission::CapabilitySet,
    },
    infra::GovernanceClient,
};

///
/// GovernanceOps
///

pub struct GovernanceOps<'a> {
    client: &'a dyn GovernanceClient,
}

impl<'a> GovernanceOps<'a> {
    #[must_use]
    pub const fn new(client: &'a dyn GovernanceClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn canister_id(&self) -> Principal {
        self.client.canister_id()
    }

    #[must_use]
    pub fn caller(&self) -> Principal {
        self.client.caller()
    }

    // ---------------------------------------------------------------------
    // manage_neuron
    // ---------------------------------------------------------------------

    /// Register a freshly funded neuron by its creation memo.
    pub async fn claim_by_memo(
        &self,
        subaccount: &Subaccount,
        memo: u64,
        controller: Principal,
    ) -> Result<NeuronId, Error> {
        let by = By::MemoAndController(MemoAndController {
            memo,
            controller: Some(controller),
        });

        self.claim_or_refresh(subaccount, by).await
    }

    /// Re-sync an existing neuron's cached stake with its ledger balance.
    pub async fn refresh(&self, subaccount: &Subaccount) -> Result<NeuronId, Error> {
        self.claim_or_refresh(subaccount, By::NeuronId(Empty {}))
            .await
    }

    async fn claim_or_refresh(&self, subaccount: &Subaccount, by: By) -> Result<NeuronId, Error> {
        let command = Command::ClaimOrRefresh(ClaimOrRefresh { by: Some(by) });

        match self.manage(subaccount, "claim_or_refresh", command).await? {
            CommandResponse::ClaimOrRefresh(res) => Ok(res
                .refreshed_neuron_id
                .unwrap_or_else(|| NeuronId::from_subaccount(subaccount))),
            other => Err(unexpected("claim_or_refresh", &other)),
        }
    }

    pub async fn configure(&self, subaccount: &Subaccount, operation: Operation) -> Result<(), Error> {
        let command = Command::Configure(Configure {
            operation: Some(operation),
        });

        match self.manage(subaccount, "configure", command).await? {
            CommandResponse::Configure(_) => Ok(()),
            other => Err(unexpected("configure", &other)),
        }
    }

    /// Split `amount` off into a new neuron; returns the new neuron's id.
    pub async fn split(
        &self,
        subaccount: &Subaccount,
        amount: Tokens,
        memo: u64,
    ) -> Result<NeuronId, Error> {
        let command = Command::Split(Split {
            amount_e8s: amount.e8s(),
            memo,
        });

        match self.manage(subaccount, "split", command).await? {
            CommandResponse::Split(res) => res
                .created_neuron_id
                .ok_or_else(|| Error::invariant("split reply carries no neuron id")),
            other => Err(unexpected("split", &other)),
        }
    }

    /// Disburse stake; `None` amount disburses everything, `None` account
    /// pays the caller.
    pub async fn disburse(
        &self,
        subaccount: &Subaccount,
        to: Option<Account>,
        amount: Option<Tokens>,
    ) -> Result<u64, Error> {
        let command = Command::Disburse(Disburse {
            to_account: to.map(GovernanceAccount::from),
            amount: amount.map(|a| Amount { e8s: a.e8s() }),
        });

        match self.manage(subaccount, "disburse", command).await? {
            CommandResponse::Disburse(res) => Ok(res.transfer_block_height),
            other => Err(unexpected("disburse", &other)),
        }
    }

    pub async fn disburse_maturity(
        &self,
        subaccount: &Subaccount,
        to: Option<Account>,
        percentage: u32,
    ) -> Result<DisburseMaturityResponse, Error> {
        let command = Command::DisburseMaturity(DisburseMaturity {
            to_account: to.map(GovernanceAccount::from),
            percentage_to_disburse: percentage,
        });

        match self.manage(subaccount, "disburse_maturity", command).await? {
            CommandResponse::DisburseMaturity(res) => Ok(res),
            other => Err(unexpected("disburse_maturity", &other)),
        }
    }

    pub async fn add_permissions(
        &self,
        subaccount: &Subaccount,
        principal: Principal,
        capabilities: CapabilitySet,
    ) -> Result<(), Error> {
        let command = Command::AddNeuronPermissions(AddNeuronPermissions {
            principal_id: Some(principal),
            permissions_to_add: Some(capabilities.to_permission_list()),
        });

        match self.manage(subaccount, "add_neuron_permissions", command).await? {
            CommandResponse::AddNeuronPermission(_) => Ok(()),
            other => Err(unexpected("add_neuron_permissions", &other)),
        }
    }

    pub async fn remove_permissions(
        &self,
        subaccount: &Subaccount,
        principal: Principal,
        capabilities: CapabilitySet,
    ) -> Result<(), Error> {
        let command = Command::RemoveNeuronPermissions(RemoveNeuronPermissions {
            principal_id: Some(principal),
            permissions_to_remove: Some(capabilities.to_permission_list()),
        });

        match self
            .manage(subaccount, "remove_neuron_permissions", command)
            .await?
        {
            CommandResponse::RemoveNeuronPermission(_) => Ok(()),
            other => Err(unexpected("remove_neuron_permissions", &other)),
        }
    }

    async fn manage(
        &self,
        subaccount: &Subaccount,
        name: &'static str,
        command: Command,
    ) -> Result<CommandResponse, Error> {
        let arg = ManageNeuron {
            subaccount: subaccount.to_vec(),
            command: Some(command),
        };

        match self.client.manage_neuron(arg).await?.command {
            Some(CommandResponse::Error(err)) => Err(Error::Permission {
                command: name,
                error_type: Some(err.error_type),
                message: err.error_message,
            }),
            Some(res) => Ok(res),
            None => Err(Error::invariant(format!("{name} reply is empty"))),
        }
    }

    // ---------------------------------------------------------------------
    // queries
    // ---------------------------------------------------------------------

    /// Fetch a neuron; `Ok(None)` when governance has no neuron there.
    pub async fn get_neuron(&self, subaccount: &Subaccount) -> Result<Option<NeuronSnapshot>, Error> {
        let arg = GetNeuron {
            neuron_id: Some(NeuronId::from_subaccount(subaccount)),
        };

        match self.client.get_neuron(arg).await?.result {
            Some(GetNeuronResult::Neuron(neuron)) => Ok(Some(NeuronSnapshot::try_from(neuron)?)),
            Some(GetNeuronResult::Error(err)) if err.error_type == error_type::NOT_FOUND => Ok(None),
            Some(GetNeuronResult::Error(err)) => Err(Error::Permission {
                command: "get_neuron",
                error_type: Some(err.error_type),
                message: err.error_message,
            }),
            None => Err(Error::invariant("get_neuron reply is empty")),
        }
    }

    /// Like [`Self::get_neuron`] but absence is an error.
    pub async fn require_neuron(&self, subaccount: &Subaccount) -> Result<NeuronSnapshot, Error> {
        self.get_neuron(subaccount)
            .await?
            .ok_or_else(|| Error::NeuronNotFound(hex::encode(subaccount)))
    }

    pub async fn list_neurons(
        &self,
        of_principal: Principal,
        limit: u32,
    ) -> Result<Vec<NeuronSnapshot>, Error> {
        let arg = ListNeurons {
            of_principal: Some(of_principal),
            limit,
            start_page_at: None,
        };

        self.client
            .list_neurons(arg)
            .await?
            .neurons
            .into_iter()
            .map(|n| NeuronSnapshot::try_from(n).map_err(Error::from))
            .collect()
    }

    pub async fn parameters(&self) -> Result<StakingParameters, Error> {
        let raw = self.client.get_nervous_system_parameters().await?;

        Ok(StakingParameters::try_from(&raw)?)
    }
}

fn unexpected(command: &str, response: &CommandResponse) -> Error {
    Error::invariant(format!("{command} got a mismatched reply: {response:?}"))
}
