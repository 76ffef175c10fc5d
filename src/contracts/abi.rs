// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Subsets of the deployed contracts' interfaces, enough for the calls we make.

use alloy_sol_types::sol;

sol! {
    /// USDC on Arbitrum Sepolia
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

sol! {
    /// Critical Money lending pool
    interface ILendingPool {
        function lendUSDC(uint256 amount) external;
        function withdraw(uint256 amount) external;
        function claimRewards() external;
        function userBalances(address account) external view returns (address user, uint256 principal);
        function rewards(address account) external view returns (uint256);
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Pledge {
        address pledgor;
        uint256 quantityInOunces;
        uint256 pledgeDate;
        uint256 redemptionDate;
        uint256 agreementId;
        bool redemptionApproved;
        uint256 ouncePrice;
    }

    /// Critical Money pledge platform
    interface IPledgePlatform {
        function pledgeRegistry(address pledgor, uint256 amount, uint256 spread) external;
        function amortizePledge(uint256 amount, uint256 pledgeId) external returns (uint256);
        function getPledgeById(uint256 pledgeId) external view returns (Pledge memory);
    }
}
